//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use constructor_core::{AreaId, GroupId, HolderId, NodeRef};

/// Edit constructor trees stored in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "constructor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (created and migrated when missing)
    #[arg(long, global = true, value_hint = ValueHint::FilePath, default_value = "constructor.db")]
    pub db: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides the config)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an area
    AreaAdd { name: String },

    /// List areas
    Areas,

    /// Print the tree of an area
    Show {
        #[arg(long)]
        area: i64,
    },

    /// Add a holder to a group, or to the area root when no group is given
    AddHolder {
        #[arg(long)]
        area: i64,
        #[arg(long)]
        group: Option<i64>,
        /// Holder name; a default name is generated when omitted
        #[arg(long)]
        name: Option<String>,
    },

    /// Give a holder a new owned group
    AddGroup {
        #[arg(long)]
        area: i64,
        holder: i64,
        /// Replace an existing sub-object
        #[arg(long)]
        overwrite: bool,
    },

    /// Rename a holder
    Rename {
        #[arg(long)]
        area: i64,
        holder: i64,
        name: String,
    },

    /// Change holder properties
    Set {
        #[arg(long)]
        area: i64,
        holder: i64,
        #[arg(long)]
        alias: Option<String>,
        #[arg(long)]
        inheritance: Option<bool>,
        #[arg(long)]
        sub_relation: Option<String>,
        #[arg(long)]
        super_relation: Option<String>,
        #[arg(long)]
        sub_group_aliases: Option<String>,
        #[arg(long)]
        invisible: Option<bool>,
        #[arg(long)]
        is_home: Option<bool>,
        #[arg(long)]
        ask_for_related_area: Option<bool>,
    },

    /// Move a holder, or all holders of a group, into a group
    Move {
        #[arg(long)]
        area: i64,
        /// Node to move (`holder:<id>` or `group:<id>`)
        #[arg(value_parser = parse_node)]
        node: NodeRef,
        /// Target node (`group:<id>`)
        #[arg(value_parser = parse_node)]
        target: NodeRef,
    },

    /// Paste a copy of a node into a group; colliding names get a numbered suffix
    Paste {
        #[arg(long)]
        area: i64,
        #[arg(value_parser = parse_node)]
        source: NodeRef,
        #[arg(value_parser = parse_node)]
        target: NodeRef,
    },

    /// Delete a node and everything it owns
    Delete {
        #[arg(long)]
        area: i64,
        /// Node to delete (`holder:<id>`, `group:<id>` or `ref:<holder>:<group>`)
        #[arg(value_parser = parse_node)]
        node: NodeRef,
        /// Confirm removal of the area root
        #[arg(long)]
        whole_tree: bool,
    },

    /// Add a link in a group pointing at a holder
    Link {
        #[arg(long)]
        area: i64,
        group: i64,
        target: i64,
    },

    /// Make a holder reference a group
    Ref {
        #[arg(long)]
        area: i64,
        holder: i64,
        group: i64,
        /// Replace an existing sub-object, deleting an owned subtree
        #[arg(long)]
        overwrite: bool,
    },
}

/// Parses `area:<id>`, `group:<id>`, `holder:<id>` or `ref:<holder>:<group>`.
pub fn parse_node(value: &str) -> Result<NodeRef, String> {
    let parts: Vec<&str> = value.split(':').collect();
    let id = |raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| format!("invalid id `{raw}` in `{value}`"))
    };
    match parts.as_slice() {
        ["area", raw] => Ok(NodeRef::area(AreaId(id(*raw)?))),
        ["group", raw] => Ok(NodeRef::group(GroupId(id(*raw)?))),
        ["holder", raw] => Ok(NodeRef::holder(HolderId(id(*raw)?))),
        ["ref", holder, group] => Ok(NodeRef::group_ref(
            HolderId(id(*holder)?),
            GroupId(id(*group)?),
        )),
        _ => Err(format!(
            "expected area:<id>, group:<id>, holder:<id> or ref:<holder>:<group>, got `{value}`"
        )),
    }
}
