//! Replay binary for `storyframe`.
//!
//! Reads newline-delimited feed messages, reassembles them through a
//! [`FeedSession`] and prints every completed story to stdout.

mod cli;

use std::{num::NonZeroUsize, time::Duration};

use clap::Parser;
use cli::{Cli, KeyPolicyArg};
use log::{info, warn};
use storyframe::{
    EmittedItem,
    FeedSession,
    KeyPolicy,
    ReassemblyConfig,
    SessionConfig,
    SessionOutput,
    parse_messages,
};
use tokio::{
    fs::File,
    io::{self, AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = session_config(&cli);
    let (tx, mut rx) = mpsc::channel::<SessionOutput>(config.channel_capacity.get());
    let session = FeedSession::spawn(config, tx);
    let printer = tokio::spawn(async move {
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Ok(item) => print_item(&item),
                Err(err) => warn!("story dropped: {err}"),
            }
        }
    });

    let reader: Box<dyn AsyncBufRead + Unpin> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path).await?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_messages(&line) {
            Ok(records) => {
                for record in records {
                    session.send(record).await?;
                }
            }
            Err(err) => warn!("skipping feed message: {err}"),
        }
    }

    let stats = session.join().await?;
    printer.await?;
    info!(
        "replay finished: records={}, emitted={}, failed={}, evicted={}",
        stats.records, stats.emitted, stats.failed, stats.evicted
    );
    Ok(())
}

fn session_config(cli: &Cli) -> SessionConfig {
    let mut reassembly = ReassemblyConfig::default().with_key_policy(match cli.key_policy {
        KeyPolicyArg::Identity => KeyPolicy::StoryIdentity,
        KeyPolicyArg::Sequential => KeyPolicy::Sequential,
    });
    if let Some(secs) = cli.stale_after {
        reassembly = reassembly.with_stale_after(Duration::from_secs(secs));
    }
    if let Some(size) = cli.max_story_size.and_then(NonZeroUsize::new) {
        reassembly = reassembly.with_max_story_size(size);
    }
    SessionConfig {
        reassembly,
        ..SessionConfig::default()
    }
}

fn print_item(item: &EmittedItem) {
    match item {
        EmittedItem::Story(story) => {
            println!("========================= Story update =======================");
            println!("Id:{}", story.id);
            println!("AltId:{}", story.alt_id);
            println!("Headline:{}\n", story.headline);
            println!("Body:{}", story.body);
            println!("==============================================================");
        }
        EmittedItem::Document { message_type, json } => {
            println!("{message_type}:");
            match serde_json::to_string_pretty(json) {
                Ok(text) => println!("{text}"),
                Err(err) => warn!("failed to format {message_type} document: {err}"),
            }
        }
    }
}
