use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Manage products through a running storefront API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all products, newest first
    List,
    /// Show one product
    Get { id: i32 },
    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        image: String,
    },
    /// Update some fields of a product
    Update {
        id: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete a product
    Delete { id: i32 },
}

fn fields(name: Option<String>, price: Option<String>, image: Option<String>) -> Value {
    let mut body = Map::new();
    if let Some(name) = name {
        body.insert("name".into(), Value::String(name));
    }
    if let Some(price) = price {
        body.insert("price".into(), Value::String(price));
    }
    if let Some(image) = image {
        body.insert("image".into(), Value::String(image));
    }
    Value::Object(body)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/products", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::List => client.get(&base).send().await?,
        Commands::Get { id } => client.get(format!("{}/{}", base, id)).send().await?,
        Commands::Create { name, price, image } => {
            client
                .post(&base)
                .json(&fields(Some(name), Some(price), Some(image)))
                .send()
                .await?
        }
        Commands::Update { id, name, price, image } => {
            client
                .put(format!("{}/{}", base, id))
                .json(&fields(name, price, image))
                .send()
                .await?
        }
        Commands::Delete { id } => client.delete(format!("{}/{}", base, id)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: API returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    Ok(())
}
