//! Clover CLI - Storefront API access from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Accounts
//! clover auth sign-in -e shopper@example.com -p secret
//! clover auth sign-up -n "Shopper" -e shopper@example.com -p secret --phone 0100000000
//!
//! # Browse the catalog (no account needed)
//! clover products list
//! clover products show 6428ebc6dc1175abc65ca0b9
//! clover categories
//! clover brands
//!
//! # Account management
//! clover account update-profile -n "Shopper" -e shopper@example.com --phone 0100000000
//! clover account update-password --current secret --new hunter22
//!
//! # Cart operations (sign in via CLOVER_EMAIL / CLOVER_PASSWORD)
//! clover cart show
//! clover cart add 6428ebc6dc1175abc65ca0b9
//! clover cart set-count 6428ebc6dc1175abc65ca0b9 3
//! clover cart remove 6428ebc6dc1175abc65ca0b9
//! clover cart clear
//!
//! # Wishlist
//! clover wishlist show
//! clover wishlist toggle 6428ebc6dc1175abc65ca0b9
//!
//! # Addresses and orders
//! clover address list
//! clover orders list
//! clover orders place --address-alias Home
//! ```
//!
//! # Environment Variables
//!
//! - `CLOVER_API_BASE_URL` - Backend API root
//! - `CLOVER_EMAIL` / `CLOVER_PASSWORD` - Account credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "clover")]
#[command(author, version, about = "Clover storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account registration
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Update the signed-in user's profile or password
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// List brands
    Brands,
    /// Inspect and mutate the signed-in user's cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Inspect and toggle the signed-in user's wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Manage saved shipping addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Place and review orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Verify credentials against the backend
    SignIn {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    SignUp {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (entered twice server-side via rePassword)
        #[arg(short, long)]
        password: String,

        /// Contact phone
        #[arg(long)]
        phone: String,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Update name, email, and phone
    UpdateProfile {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Contact phone
        #[arg(long)]
        phone: String,
    },
    /// Change the account password
    UpdatePassword {
        /// Current password
        #[arg(long)]
        current: String,

        /// New password
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List the catalog
    List,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart with line details
    Show,
    /// Add one unit of a product
    Add {
        /// Product id
        id: String,
    },
    /// Set the quantity of a product's line
    SetCount {
        /// Product id
        id: String,
        /// New quantity (>= 1)
        count: u32,
    },
    /// Remove a product's line
    Remove {
        /// Product id
        id: String,
    },
    /// Delete the whole cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Add the product if absent, remove it if present
    Toggle {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        /// Short label (`Home`, `Work`, ...)
        #[arg(short, long)]
        alias: String,

        /// Street details
        #[arg(short, long)]
        details: String,

        /// Contact phone
        #[arg(short, long)]
        phone: String,

        /// City
        #[arg(short, long)]
        city: String,

        /// Postal code
        #[arg(long, default_value = "")]
        postal_code: String,
    },
    /// Delete a saved address
    Remove {
        /// Address id
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List the user's past orders
    List,
    /// Place a cash-on-delivery order for the current cart
    Place {
        /// Alias of the saved address to ship to
        #[arg(long)]
        address_alias: String,
    },
    /// Start a card checkout session and print its redirect URL
    Checkout {
        /// Alias of the saved address to ship to
        #[arg(long)]
        address_alias: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::SignIn { email, password } => {
                commands::account::sign_in(&email, &password).await?;
            }
            AuthAction::SignUp {
                name,
                email,
                password,
                phone,
            } => commands::account::sign_up(&name, &email, &password, &phone).await?,
        },
        Commands::Account { action } => match action {
            AccountAction::UpdateProfile { name, email, phone } => {
                commands::account::update_profile(&name, &email, &phone).await?;
            }
            AccountAction::UpdatePassword { current, new } => {
                commands::account::update_password(&current, &new).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List => commands::catalog::list().await?,
            ProductsAction::Show { id } => commands::catalog::show(&id).await?,
        },
        Commands::Categories => commands::catalog::list_categories().await?,
        Commands::Brands => commands::catalog::list_brands().await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add { id } => commands::cart::add(&id).await?,
            CartAction::SetCount { id, count } => commands::cart::set_count(&id, count).await?,
            CartAction::Remove { id } => commands::cart::remove(&id).await?,
            CartAction::Clear => commands::cart::clear().await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show().await?,
            WishlistAction::Toggle { id } => commands::wishlist::toggle(&id).await?,
        },
        Commands::Address { action } => match action {
            AddressAction::List => commands::account::list_addresses().await?,
            AddressAction::Add {
                alias,
                details,
                phone,
                city,
                postal_code,
            } => {
                commands::account::add_address(&alias, &details, &phone, &city, &postal_code)
                    .await?;
            }
            AddressAction::Remove { id } => commands::account::remove_address(&id).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::account::list_orders().await?,
            OrdersAction::Place { address_alias } => {
                commands::account::place_order(&address_alias).await?;
            }
            OrdersAction::Checkout { address_alias } => {
                commands::account::checkout(&address_alias).await?;
            }
        },
    }
    Ok(())
}
