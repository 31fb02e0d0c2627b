//! Command-line front end for the constructor tree engine.
//!
//! # Responsibility
//! - Open the database, build one editor session and run one command.
//! - Print the resulting outline, or the error chain with exit status 1.

mod args;

use args::{Cli, Commands};
use clap::Parser;
use constructor_core::{
    init_logging, open_db, AreaId, ConstructorEditor, ConstructorGateway, EngineConfig, GroupId,
    HolderId, HolderPatch, NodeRef, NumberedCopies, SqliteConstructorGateway,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = cli.log_dir {
        config.logging.log_dir = Some(dir);
    }
    if config.logging.log_dir.is_some() {
        init_logging(&config.logging)?;
    }

    let conn = open_db(&cli.db)?;
    let gateway = SqliteConstructorGateway::try_new(&conn)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_label(&cli.command)
    );

    match cli.command {
        Commands::AreaAdd { name } => {
            let id = gateway.insert_area(name.trim())?;
            println!("{id}");
        }
        Commands::Areas => {
            for area in gateway.list_areas()? {
                let root = area
                    .constructor_group_id
                    .map(|group| group.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{root}", area.id, area.name);
            }
        }
        Commands::Show { area } => {
            let editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            print_outline(&editor);
        }
        Commands::AddHolder { area, group, name } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            let id = match group {
                Some(group) => editor.add_holder(GroupId(group), name.as_deref())?,
                None => editor.add_root_holder(AreaId(area), name.as_deref())?,
            };
            println!("{id}");
            print_outline(&editor);
        }
        Commands::AddGroup {
            area,
            holder,
            overwrite,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            let id = editor.add_group(HolderId(holder), overwrite)?;
            println!("{id}");
            print_outline(&editor);
        }
        Commands::Rename { area, holder, name } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            editor.rename_holder(HolderId(holder), &name)?;
            print_outline(&editor);
        }
        Commands::Set {
            area,
            holder,
            alias,
            inheritance,
            sub_relation,
            super_relation,
            sub_group_aliases,
            invisible,
            is_home,
            ask_for_related_area,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            let patch = HolderPatch {
                alias,
                inheritance,
                sub_relation_name: sub_relation,
                super_relation_name: super_relation,
                sub_group_aliases,
                invisible,
                is_home,
                ask_for_related_area,
                area_id: None,
            };
            editor.update_holder(HolderId(holder), &patch)?;
            print_outline(&editor);
        }
        Commands::Move { area, node, target } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            editor.move_node(node, target)?;
            print_outline(&editor);
        }
        Commands::Paste {
            area,
            source,
            target,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            let created = editor.paste(source, target, &mut NumberedCopies)?;
            println!("pasted {} holder(s)", created.len());
            print_outline(&editor);
        }
        Commands::Delete {
            area,
            node,
            whole_tree,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            editor.delete_node(node, whole_tree)?;
            print_outline(&editor);
        }
        Commands::Link {
            area,
            group,
            target,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            editor.start_link(GroupId(group))?;
            editor.select(NodeRef::holder(HolderId(target)))?;
            print_outline(&editor);
        }
        Commands::Ref {
            area,
            holder,
            group,
            overwrite,
        } => {
            let mut editor = ConstructorEditor::open(gateway, AreaId(area), config)?;
            editor.start_group_reference(HolderId(holder), overwrite)?;
            editor.select(NodeRef::group(GroupId(group)))?;
            print_outline(&editor);
        }
    }
    Ok(())
}

fn print_outline<G: ConstructorGateway>(editor: &ConstructorEditor<G>) {
    for line in editor.outline() {
        println!("{line}");
    }
    for link in editor.links().broken_links() {
        println!("warning: {link} is a broken link");
    }
}

fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::AreaAdd { .. } => "area-add",
        Commands::Areas => "areas",
        Commands::Show { .. } => "show",
        Commands::AddHolder { .. } => "add-holder",
        Commands::AddGroup { .. } => "add-group",
        Commands::Rename { .. } => "rename",
        Commands::Set { .. } => "set",
        Commands::Move { .. } => "move",
        Commands::Paste { .. } => "paste",
        Commands::Delete { .. } => "delete",
        Commands::Link { .. } => "link",
        Commands::Ref { .. } => "ref",
    }
}
