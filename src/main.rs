use std::env;
use std::fs::File;
use std::io::{Error, ErrorKind, Result};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, LevelFilter};

use chatbot_client::chatbot_api::ChatbotApi;
use chatbot_client::settings::Settings;
use chatbot_client::{dev_server, std_logger, ApiError, ClientConfig, Document, DocumentTokenSupplier, HttpClient, HttpMethod, RequestConfig};

#[derive(Parser)]
#[command(name = "chatbot_client", version, about = "HTTP client and dev server for the chatbot front-end")]
struct Cli {
    /// YAML settings file.
    #[arg(short, long, env = "CHATBOT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the page and forward backend paths to the Django server.
    Serve,
    /// Send one request through the configured client and print the response.
    Request {
        method: String,
        path: String,
        /// JSON request body.
        #[arg(short, long)]
        data: Option<String>,
        /// HTML page to read the CSRF token from.
        #[arg(long)]
        page: Option<PathBuf>,
    },
    /// Start a chat session, send one message and print the bot's reply.
    Chat {
        message: String,
        /// HTML page to read the CSRF token from.
        #[arg(long)]
        page: Option<PathBuf>,
    },
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    std_logger::init(cli.log_level).map_err(|err| Error::new(ErrorKind::Other, err))?;

    let settings = read_settings(cli.config)?;
    let client_config = settings.client_config().map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;

    match cli.command {
        Command::Serve => dev_server::run(settings.dev_server_config(), &client_config).await,
        Command::Chat { message, page } => {
            let client = configure_client(client_config, page)?;
            let api = ChatbotApi::new(Arc::new(client));

            let session = api.start_session().await.map_err(|err| Error::new(ErrorKind::Other, err))?;
            println!("{}", session.message.content);

            let exchange = api
                .send_message(&session.session_id, &message)
                .await
                .map_err(|err| Error::new(ErrorKind::Other, err))?;
            println!("{}", exchange.bot_message.content);
            Ok(())
        }
        Command::Request { method, path, data, page } => {
            let client = configure_client(client_config, page)?;

            let method = HttpMethod::try_from(method.as_str()).map_err(|err| Error::new(ErrorKind::InvalidInput, err))?;
            let mut request = RequestConfig::new(method, &path);
            if let Some(body) = data {
                request = request.set_body(body);
            }

            match client.send(request).await {
                Ok(response) => {
                    println!("{}", response.status());
                    println!("{}", response.text());
                    Ok(())
                }
                Err(ApiError::Status(response)) => {
                    println!("{}", response.status());
                    println!("{}", response.text());
                    Err(Error::new(ErrorKind::Other, format!("request failed with status {}", response.status())))
                }
                Err(err) => {
                    error!("{}", err);
                    Err(Error::new(ErrorKind::Other, err))
                }
            }
        }
    }
}

fn configure_client(client_config: ClientConfig, page: Option<PathBuf>) -> Result<HttpClient> {
    let document = match page {
        Some(page_path) => Document::load(&page_path)?,
        None => Document::empty(),
    };
    let supplier = DocumentTokenSupplier::new(Arc::new(document));

    HttpClient::configure(client_config, supplier).map_err(|err| Error::new(ErrorKind::InvalidInput, err))
}

fn read_settings(config: Option<PathBuf>) -> Result<Settings> {
    let settings = match config {
        Some(path) => {
            let config_fd = File::open(path)?;
            Settings::load_from_file(&config_fd).map_err(|err| Error::new(ErrorKind::InvalidData, err))?
        }
        None => Settings::default(),
    };

    Ok(settings.apply_env(|key| env::var(key).ok()))
}
