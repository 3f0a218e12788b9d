#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::Parser;
use waymark::app::App;
use waymark::form::FormFields;
use waymark::store::SqliteStore;
use waymark::terminal::{FixedLocation, TerminalMap, TerminalUi};
use waymark::types::ActivityKind;
use waymark::{cli, utils};

#[macro_use]
extern crate waymark;

type TerminalApp = App<SqliteStore, TerminalMap, FixedLocation, TerminalUi>;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let cmd = cli.cmd.unwrap_or(cli::Cmd::List);
    // Clicking the map implies it is loaded, so a workout position doubles as the device position.
    let here = match &cmd {
        cli::Cmd::Add { at, .. } => cli.here.or(Some(*at)),
        _ => cli.here,
    };
    dlog!("db={} here={here:?} zoom={}", cli.db.display(), cli.zoom);

    let mut app: TerminalApp = App::new(
        SqliteStore::open(&cli.db)?,
        TerminalMap::new(),
        FixedLocation(here),
        TerminalUi::new(),
    )
    .with_zoom(cli.zoom);
    app.start();

    match cmd {
        cli::Cmd::List => print_list(&app),
        cli::Cmd::Html => {
            for entry in app.ui().entries() {
                println!("{}", entry.to_html());
            }
        }
        cli::Cmd::Add {
            kind,
            at,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            if kind == ActivityKind::Cycling {
                app.on_variant_field_toggled();
            }
            app.on_map_clicked(at);
            let fields = FormFields {
                kind: kind.tag().to_string(),
                distance,
                duration,
                cadence,
                elevation,
            };
            let w = app.on_form_submitted(&fields)?;
            println!("{}\t{}", w.id(), w.description());
        }
        cli::Cmd::Show { id } => match app.on_list_entry_clicked(&id) {
            Some(w) => {
                let (desc, coords) = (w.description().to_string(), w.coords());
                match app.map().view() {
                    Some((at, zoom)) => println!("{desc}\t{}\tzoom {zoom}", utils::maps_url(at)),
                    None => println!("{desc}\t{}", utils::maps_url(coords)),
                }
            }
            None => anyhow::bail!("no workout with id {id}"),
        },
        cli::Cmd::DeleteLast => {
            match app.delete_last()? {
                Some(w) => println!("deleted {}\t{}", w.id(), w.description()),
                None => println!("nothing to delete"),
            }
            print_list(&app);
        }
        cli::Cmd::Reset => {
            app.reset()?;
            println!("all workouts removed");
        }
    }

    Ok(())
}

fn print_list(app: &TerminalApp) {
    let entries = app.ui().entries();
    if entries.is_empty() {
        println!("no workouts yet");
    }
    for entry in entries {
        println!("{entry}");
    }
}
