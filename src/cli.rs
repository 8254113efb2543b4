//! Command line interface for the `storyframe` replay binary.
//!
//! The binary replays newline-delimited feed messages through a reassembly
//! session and prints each completed story. This module stays free of crate
//! types so the build script can render a man page from it.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// How the replay keys in-flight assemblies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum KeyPolicyArg {
    /// One slot per `(guid, source)` pair.
    #[default]
    Identity,
    /// One story in flight at a time, in arrival order.
    Sequential,
}

/// Command line arguments for the `storyframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "storyframe",
    version,
    about = "Replay news feed updates and print reassembled stories"
)]
pub struct Cli {
    /// File of newline-delimited feed messages; reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Assembly keying strategy.
    #[arg(long, value_enum, default_value_t = KeyPolicyArg::Identity)]
    pub key_policy: KeyPolicyArg,

    /// Evict incomplete stories after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub stale_after: Option<u64>,

    /// Reject stories that declare more than this many compressed bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_story_size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, KeyPolicyArg};

    #[test]
    fn defaults_to_stdin_and_identity_keys() {
        let cli = Cli::parse_from(["storyframe"]);
        assert!(cli.input.is_none());
        assert_eq!(cli.key_policy, KeyPolicyArg::Identity);
        assert!(cli.stale_after.is_none());
    }

    #[test]
    fn parses_all_options() {
        let cli = Cli::parse_from([
            "storyframe",
            "--input",
            "feed.jsonl",
            "--key-policy",
            "sequential",
            "--stale-after",
            "90",
            "--max-story-size",
            "4096",
        ]);
        assert_eq!(cli.input.as_deref(), Some(std::path::Path::new("feed.jsonl")));
        assert_eq!(cli.key_policy, KeyPolicyArg::Sequential);
        assert_eq!(cli.stale_after, Some(90));
        assert_eq!(cli.max_story_size, Some(4096));
    }
}
