//! feedctl
//!
//! Loads a feed dump (a JSON array of posts, or `{"tweets": [...]}` as the
//! backend returns it) into a session and prints one of its views.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use feed_client::{ClientConfig, FeedSession, MemoryTransport, StaticIdentity};
use feed_tree::{FeedEntry, Identity, Post, ThreadContext, ViewMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Accepted dump shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDump {
    Bare(Vec<Post>),
    Wrapped { tweets: Vec<Post> },
}

impl FeedDump {
    fn into_posts(self) -> Vec<Post> {
        match self {
            Self::Bare(posts) | Self::Wrapped { tweets: posts } => posts,
        }
    }
}

fn parse_dump(text: &str) -> Result<Vec<Post>> {
    let dump: FeedDump = serde_json::from_str(text)
        .context("feed dump is neither a post array nor {\"tweets\": [...]}")?;
    Ok(dump.into_posts())
}

fn posts_arg() -> Arg {
    Arg::new("posts")
        .long("posts")
        .short('p')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Feed dump to load")
}

fn cli() -> Command {
    Command::new("feedctl")
        .version(feed_client::VERSION)
        .about("Inspect a feed dump through the client views")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Client configuration (TOML)"),
        )
        .arg(
            Arg::new("as")
                .long("as")
                .global(true)
                .help("Handle of the viewer; omit to browse anonymously"),
        )
        .subcommand(
            Command::new("view")
                .about("Print a projected feed")
                .arg(posts_arg())
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .short('m')
                        .help("timeline, tweets, replies or most_liked"),
                )
                .arg(
                    Arg::new("mine")
                        .long("mine")
                        .action(ArgAction::SetTrue)
                        .help("Only replies written by the viewer"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("thread")
                .about("Print a post with its parent and siblings")
                .arg(posts_arg())
                .arg(Arg::new("id").required(true).help("Post id")),
        )
        .subcommand(
            Command::new("stats")
                .about("Summarize the feed")
                .arg(posts_arg()),
        )
}

fn load_config(matches: &ArgMatches) -> Result<ClientConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

async fn open_session(
    path: &Path,
    viewer: Option<&String>,
    config: ClientConfig,
) -> Result<FeedSession> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let posts = parse_dump(&text)?;
    debug!(roots = posts.len(), path = %path.display(), "parsed feed dump");

    let identity = viewer.map(|handle| Identity::new().with_handle(handle.as_str()));
    let mut transport = MemoryTransport::new().with_posts(posts);
    if let Some(identity) = &identity {
        transport = transport.with_viewer(identity.clone());
    }
    let provider = identity.map_or_else(StaticIdentity::anonymous, StaticIdentity::new);

    let session = FeedSession::new(Arc::new(transport), Arc::new(provider), config);
    let count = session.refresh().await?;
    info!(posts = count, "feed loaded");
    Ok(session)
}

fn render_entry(entry: &FeedEntry, own: bool) -> String {
    let post = entry.post();
    let indent = "  ".repeat(entry.depth());
    let author = if post.username.is_empty() { "anonymous" } else { post.username.as_str() };
    let marker = if own { " (you)" } else { "" };
    let liked = if post.liked_by_user { "*" } else { "" };
    format!(
        "{indent}[{id}] @{author}{marker} {likes}{liked} likes, {replies} replies: {content}",
        id = post.id,
        likes = post.likes,
        replies = entry.reply_count(),
        content = post.content,
    )
}

fn render_thread(thread: &ThreadContext) -> Vec<String> {
    let mut lines = Vec::new();
    match &thread.parent {
        Some(parent) => lines.push(format!(
            "in reply to [{}] @{}: {}",
            parent.id(),
            parent.record.username,
            parent.record.content
        )),
        None => lines.push("root post".to_string()),
    }
    lines.push(format!(
        "> [{}] @{}: {} ({} likes, {} replies)",
        thread.target.id(),
        thread.target.record.username,
        thread.target.record.content,
        thread.target.record.likes,
        thread.target.replies.len(),
    ));
    for sibling in thread.siblings.iter().filter(|s| s.id() != thread.target.id()) {
        lines.push(format!("  sibling [{}] @{}", sibling.id(), sibling.record.username));
    }
    lines
}

fn run_view(session: &FeedSession, args: &ArgMatches) -> Result<()> {
    let mode = match args.get_one::<String>("mode") {
        Some(name) => name.parse::<ViewMode>()?,
        None => session.config().default_view,
    };
    let entries = if args.get_flag("mine") {
        if session.caller().is_none() {
            bail!("--mine needs a viewer (--as HANDLE)");
        }
        session.my_replies()
    } else {
        session.view(mode)
    };

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        println!("{}", render_entry(entry, session.is_owner(entry.post().id.as_str())));
    }
    Ok(())
}

async fn run_thread(session: &FeedSession, args: &ArgMatches) -> Result<()> {
    let Some(id) = args.get_one::<String>("id") else {
        bail!("missing post id");
    };
    let thread = session.open_thread(id).await?;
    for line in render_thread(&thread) {
        println!("{line}");
    }
    Ok(())
}

fn run_stats(session: &FeedSession) {
    let timeline = session.view(ViewMode::Timeline);
    let roots = session.view(ViewMode::RootsOnly).len();
    let likes: u64 = timeline.iter().map(|entry| entry.post().likes).sum();
    let deepest = timeline.iter().map(FeedEntry::depth).max().unwrap_or(0);

    println!("posts:   {}", timeline.len());
    println!("roots:   {roots}");
    println!("replies: {}", timeline.len() - roots);
    println!("likes:   {likes}");
    println!("depth:   {deepest}");
    if session.caller().is_some() {
        println!("liked by you: {}", session.liked_posts().len());
        println!("your replies: {}", session.my_replies().len());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let Some((name, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    // global flags are visible from the subcommand wherever they were given
    let config = load_config(args)?;
    let viewer = args.get_one::<String>("as");
    let Some(path) = args.get_one::<PathBuf>("posts") else {
        bail!("--posts is required");
    };
    let session = open_session(path, viewer, config).await?;

    match name {
        "view" => run_view(&session, args)?,
        "thread" => run_thread(&session, args).await?,
        "stats" => run_stats(&session),
        other => bail!("unknown command {other}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_tree::PostRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_both_dump_shapes() {
        let bare = r#"[{"id":"a","createDate":1,"replies":[{"id":"b","createDate":2}]}]"#;
        let wrapped = r#"{"tweets":[{"id":"a","createDate":1}]}"#;
        assert_eq!(parse_dump(bare).unwrap()[0].node_count(), 2);
        assert_eq!(parse_dump(wrapped).unwrap().len(), 1);
        assert!(parse_dump(r#"{"posts":[]}"#).is_err());
    }

    #[test]
    fn sample_dump_loads() {
        let posts = parse_dump(include_str!("../data/sample.json")).unwrap();
        let total: usize = posts.iter().map(Post::node_count).sum();
        assert_eq!(total, 4);
        assert_eq!(posts[1].record.author_id.as_ref().map(|id| id.as_str()), Some("3"));
    }

    #[test]
    fn entry_line_shows_depth_and_owner() {
        let entry = FeedEntry::new(
            PostRecord::new("r1", 5)
                .with_author(1u64, "Ahmet", "chaotic_orange")
                .with_content("hi")
                .with_likes(3),
            2,
            0,
        );
        assert_eq!(
            render_entry(&entry, true),
            "    [r1] @chaotic_orange (you) 3 likes, 0 replies: hi"
        );
    }

    #[test]
    fn thread_lines_skip_target_among_siblings() {
        let parent = Post::new(PostRecord::new("p", 1))
            .with_reply(Post::new(PostRecord::new("t", 2)))
            .with_reply(Post::new(PostRecord::new("s", 3)));
        let target = parent.replies[0].clone();
        let lines = render_thread(&ThreadContext::new(target, Some(parent)));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "  sibling [s] @");
    }

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }
}
