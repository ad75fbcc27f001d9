use blogfront::blog::Blog;
use blogfront::post::PostRecord;
use blogfront::site::Site;
use clap::{ArgGroup, Parser, Subcommand};
use std::cell::RefCell;
use std::error::Error;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// The environment variable holding the log filter.
const LOG_ENV: &str = "BLOGFRONT_LOG";

/// Front-end tooling for a static Markdown blog.
#[derive(Parser)]
#[command(name = "blogfront", version, about)]
struct Cli {
    /// The site directory, or any directory beneath it.
    #[arg(long, global = true, default_value = ".")]
    site: PathBuf,

    /// Act as if the OS prefers a dark color scheme.
    #[arg(long, global = true)]
    prefers_dark: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the post index from the pages directory.
    Index,

    /// Print the posts passing the given filters.
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Print every tag with its post count.
    Tags,

    /// Render the page for one post.
    Render {
        /// The post file, relative to the pages directory.
        file: String,
    },

    /// Render the post list page.
    Page {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Write the Atom feed.
    Feed {
        /// Defaults to `feed.atom` in the site directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show or change the color theme.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Replay search box keystrokes from stdin. Each line is `<ms> <text>`,
    /// or `<ms> !enter <text>` for the Enter key.
    Search,
}

#[derive(Subcommand)]
enum ThemeAction {
    Show,
    Toggle,
    /// Report a change of the OS color scheme.
    #[command(group(ArgGroup::new("scheme").required(true).args(["dark", "light"])))]
    OsChanged {
        #[arg(long)]
        dark: bool,
        #[arg(long)]
        light: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let site = Site::open(&cli.site)?;
    let os_prefers_dark = cli.prefers_dark.then_some(true);

    match cli.command {
        Command::Index => {
            let count = site.build_index()?;
            println!("indexed {} posts into {}", count, site.config.index_path().display());
        }
        Command::List { tag, search } => {
            let mut blog = site.load_blog()?;
            let shown = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&shown);
            blog.subscribe(move |event| *sink.borrow_mut() = event.posts.clone());
            blog.set_active_tag(tag.as_deref());
            blog.set_search_query(&search);
            for post in shown.borrow().iter() {
                print_post(post);
            }
        }
        Command::Tags => {
            for tag in site.load_blog()?.tags() {
                println!("{}\t{}", tag.count, tag.tag);
            }
        }
        Command::Render { file } => {
            let theme = site.theme(os_prefers_dark)?.theme();
            print!("{}", site.post_page(Some(&file), theme)?);
        }
        Command::Page { tag, search } => {
            let theme = site.theme(os_prefers_dark)?.theme();
            print!("{}", site.index_page(tag.as_deref(), &search, theme)?);
        }
        Command::Feed { out } => {
            let path = out.unwrap_or_else(|| site.config.site_directory.join("feed.atom"));
            site.write_feed(&path)?;
            println!("wrote {}", path.display());
        }
        Command::Theme { action } => {
            let mut controller = site.theme(os_prefers_dark)?;
            match action.unwrap_or(ThemeAction::Show) {
                ThemeAction::Show => {}
                ThemeAction::Toggle => {
                    controller.toggle()?;
                }
                ThemeAction::OsChanged { dark, light: _ } => {
                    if !controller.os_preference_changed(dark)? {
                        println!("keeping the stored preference");
                    }
                }
            }
            println!("{}", controller.theme());
        }
        Command::Search => replay_search(site.load_blog()?)?,
    }
    Ok(())
}

fn print_post(post: &PostRecord) {
    println!("{}\t{}\t{}", post.date, post.title, post.file);
    if !post.tags.is_empty() {
        println!("\ttags: {}", post.tags.join(", "));
    }
}

// Each line is applied at its timestamp, after firing whatever commit fell due
// before it. A pending commit is flushed at the end of input.
fn replay_search(mut blog: Blog) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    for (number, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (ms, text) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        let ms: u64 = ms
            .parse()
            .map_err(|err| format!("line {}: bad timestamp `{}`: {}", number + 1, ms, err))?;
        let now = Duration::from_millis(ms);

        if blog.tick(now) {
            print_commit(&blog);
        }
        match text.strip_prefix("!enter") {
            Some(value) => {
                blog.search_confirm(value.strip_prefix(' ').unwrap_or(value));
                print_commit(&blog);
            }
            None => blog.search_input(text, now),
        }
    }

    if let Some(deadline) = blog.next_deadline() {
        if blog.tick(deadline) {
            print_commit(&blog);
        }
    }
    Ok(())
}

fn print_commit(blog: &Blog) {
    println!(
        "search {:?}: {} posts",
        blog.filter_state().search_query(),
        blog.filtered().len()
    );
}
