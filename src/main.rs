extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate term_grid;
extern crate chip8asm;

use chip8asm::assembler::{self, Assembly};

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tCheck Only: {}\n\tOrigin: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("check"),
        args.value_of("base").unwrap_or("0"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap_or("None")
    );

    let ifile = args.value_of("INPUT").unwrap_or_default();
    let ipath = Path::new(ifile);

    let origin = match parse_address(args.value_of("base").unwrap_or("0")) {
        Ok(addr) => addr,
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
    };

    let source = match fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    };

    let assembly = match assembler::assemble_listing(&ipath.display().to_string(), &source, origin) {
        Err(err) => {
            error!("{}", err);
            error!("Stopped assembly of `{}`.", ipath.display());
            std::process::exit(1);
        },
        Ok(assembly) => assembly,
    };

    if args.is_present("print-debug") {
        print_listing(&assembly);
    }

    let bytes = assembly.bytes();

    if args.is_present("check") {
        info!("`{}` assembled to {} byte(s); nothing written", ipath.display(), bytes.len());
        return;
    }

    let opath: PathBuf = match args.value_of("output") {
        Some(filename) => PathBuf::from(filename),
        None => ipath.with_extension("bin"),
    };

    if let Err(err) = fs::write(&opath, &bytes) {
        error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }
    info!("wrote {} byte(s) to `{}`", bytes.len(), opath.display());
}

/// Accepts `512`, `#200` or `0x200`.
fn parse_address(s: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix('#') {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|e| format!("invalid base address `{}`: {}", s, e))
}

fn print_listing(assembly: &Assembly) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for line in assembly.listing.iter() {
        let bytes: Vec<String> = line.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        grid.add(Cell::from(format!("0x{:04X}:", line.address)));
        grid.add(Cell::from(format!("{}", line.statement)));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(bytes.join(" ")));
    }

    println!("{}", grid.fit_into_columns(4));

    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (name, addr) in assembly.symbols.iter() {
        grid.add(Cell::from(name.as_str()));
        grid.add(Cell::from(format!("0x{:04X}", addr)));
    }

    println!("{}", grid.fit_into_columns(2));
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write output to an outfile"))
        .arg(Arg::with_name("base")
            .short("b")
            .takes_value(true)
            .validator(|s| parse_address(&s).map(|_| ()))
            .help("address the program starts at (512, #200 or 0x200)"))
        .arg(Arg::with_name("check")
            .short("c")
            .takes_value(false)
            .help("assemble without writing an outfile"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the listing and symbol table alongside the assembly to STDOUT"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
