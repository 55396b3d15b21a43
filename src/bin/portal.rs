use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parish_portal::client::ApiClient;
use parish_portal::config::Settings;
use parish_portal::models::{Credentials, Signup};
use parish_portal::server::app::run_server;
use parish_portal::session::{AuthContext, FileStore, Session};
use parish_portal::telemetry::init_tracing;
use parish_portal::views::{
    can_delete, can_edit, events_feed, ArticleBoard, ArticleForm, CategoryFilter, RecentPost,
    ViewState,
};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./portal.toml when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the portal server
    Serve,
    /// Log in and remember the session
    Login {
        #[clap(long)]
        email: String,
        #[clap(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup {
        #[clap(long)]
        email: String,
        #[clap(long)]
        username: String,
        #[clap(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the remembered session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List articles, optionally for one category
    Articles {
        #[clap(long)]
        category: Option<String>,
    },
    /// Show the most recent article
    Recent,
    /// List events
    Events,
    /// Publish an article
    Publish {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
        #[clap(long, default_value = "")]
        image_url: String,
        #[clap(long, default_value = "")]
        category: String,
    },
    /// Change the title or content of an article
    Edit {
        id: i64,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
    },
    /// Delete an article
    Delete {
        id: i64,
        /// Do not ask for confirmation
        #[clap(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Cannot load configuration")?;
    let client = ApiClient::new(&settings.client).context("Cannot build HTTP client")?;

    match cli.command {
        Commands::Serve => run_server(&settings).await?,
        Commands::Login { email, password } => {
            let mut auth = open_session(&settings)?;
            let response = client.login(&Credentials { email, password }).await?;
            auth.login(&response.user.username, &response.token, &response.user.role)?;
            println!("Logged in as {} ({})", response.user.username, response.user.role);
        }
        Commands::Signup {
            email,
            username,
            password,
        } => {
            let message = client
                .signup(&Signup {
                    email,
                    password,
                    username,
                })
                .await?;
            println!("{}", message.message);
        }
        Commands::Logout => {
            open_session(&settings)?.logout()?;
            println!("Logged out");
        }
        Commands::Whoami => match open_session(&settings)?.session() {
            Session::Authenticated(identity) => {
                println!("{} ({})", identity.username, identity.role)
            }
            Session::Anonymous => println!("Not logged in"),
        },
        Commands::Articles { category } => {
            let auth = open_session(&settings)?;
            let mut board = ArticleBoard::mount(&client);
            board.set_filter(CategoryFilter::from_query(category.as_deref()));
            board.settle().await;
            print_board(&board, auth.session());
        }
        Commands::Recent => {
            let mut recent = RecentPost::mount(&client);
            recent.settle().await;
            match recent.view() {
                ViewState::Populated(article) => {
                    println!("{article}");
                    println!();
                    println!("{}", article.content);
                }
                ViewState::Empty => println!("No recent posts available."),
                ViewState::Failed(message) => anyhow::bail!(message),
                ViewState::Loading => {}
            }
        }
        Commands::Events => {
            let mut events = events_feed(&client);
            events.settle().await;
            match events.view() {
                ViewState::Populated(events) => events.iter().for_each(|e| println!("{e}")),
                ViewState::Empty => println!("No events available."),
                ViewState::Failed(message) => anyhow::bail!(message),
                ViewState::Loading => {}
            }
        }
        Commands::Publish {
            title,
            content,
            image_url,
            category,
        } => {
            let auth = open_session(&settings)?;
            let mut board = ArticleBoard::mount(&client);
            board.settle().await;
            let form = ArticleForm {
                title,
                content,
                image_url,
                category_name: category,
            };
            let created = board.publish(&client, auth.session(), form).await?;
            println!("Published {created}");
        }
        Commands::Edit { id, title, content } => {
            let auth = open_session(&settings)?;
            let mut board = ArticleBoard::mount(&client);
            board.settle().await;
            let draft = board.begin_edit(auth.session(), id)?;
            if title.is_none() && content.is_none() {
                board.cancel_edit();
                println!("Nothing to change");
                return Ok(());
            }
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(content) = content {
                draft.content = content;
            }
            board.save(&client, auth.session()).await?;
            println!("Article {id} updated");
        }
        Commands::Delete { id, yes } => {
            let auth = open_session(&settings)?;
            let mut board = ArticleBoard::mount(&client);
            board.settle().await;
            let confirm = |prompt: &str| yes || ask(prompt);
            if board.delete(&client, auth.session(), id, &confirm).await? {
                println!("Article {id} deleted");
            } else {
                println!("Cancelled");
            }
        }
    }
    Ok(())
}

fn open_session(settings: &Settings) -> anyhow::Result<AuthContext<FileStore>> {
    let path = &settings.session.path;
    AuthContext::rehydrate(FileStore::new(path))
        .with_context(|| format!("Cannot read session from {}", path.display()))
}

fn print_board(board: &ArticleBoard, session: &Session) {
    let categories = board.categories();
    if !categories.is_empty() {
        println!(
            "Categories: {} (showing {})",
            categories.join(", "),
            board.filter().label()
        );
    }
    match board.view() {
        ViewState::Populated(articles) => {
            for article in articles {
                let mut actions = Vec::new();
                if can_edit(session, article) {
                    actions.push("edit");
                }
                if can_delete(session) {
                    actions.push("delete");
                }
                if actions.is_empty() {
                    println!("{article}");
                } else {
                    println!("{article}  [{}]", actions.join("|"));
                }
            }
        }
        ViewState::Empty => println!("No articles available."),
        ViewState::Failed(message) => eprintln!("{message}"),
        ViewState::Loading => println!("Loading articles..."),
    }
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "o" | "oui"
    )
}
