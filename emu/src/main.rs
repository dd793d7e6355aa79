use clap::Parser;
use color_print::cprintln;
use emu::console::StdConsole;
use emu::hooks::{dump::Dump, trace::Trace, Hook};
use emu::model::State;
use emu::{loader, Error};
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[clap(
    name = "mipsemu",
    author = "kanade-k-1228",
    version = "v1.0.0",
    about = "Emulator for the MIPS subset emitted by minic"
)]
struct Args {
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    #[arg(short, long)]
    dump_cfg: Option<String>,

    #[arg(short = 'a', long)]
    dump_all: bool,

    /// Print every executed instruction
    #[arg(long)]
    trace: bool,

    /// Read program input from a file instead of stdin
    #[arg(short, long)]
    stdin: Option<String>,

    /// Highlight program output
    #[arg(long)]
    style: bool,

    #[arg(default_value = "out.asm")]
    input_file: String,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = emulate(args) {
        cprintln!("<red,bold>error</>: {}", err);
        std::process::exit(1);
    }
}

fn emulate(args: Args) -> Result<(), Error> {
    println!("+-----------------------------------------------+");
    println!("| Emulate: {:<36} |", args.input_file);
    println!("+-----------------------------------------------+");

    let source = std::fs::read_to_string(&args.input_file)
        .map_err(|e| Error::FileOpen(args.input_file.clone(), e))?;
    let state = State::new(loader::load(&source)?);

    let mut console = match &args.stdin {
        Some(fname) => {
            let file = File::open(fname).map_err(|e| Error::FileOpen(fname.clone(), e))?;
            StdConsole::new(args.style, Box::new(BufReader::new(file)))
        }
        None => StdConsole::stdin(args.style),
    };

    println!("[INIT]");
    let mut hooks: Vec<Box<dyn Hook>> = vec![Box::new(Dump::arg(args.dump_cfg, args.dump_all)?)];
    if args.trace {
        hooks.push(Box::new(Trace));
    }

    let state = emu::run(state, &mut console, &mut hooks, args.tmax)?;
    println!();
    println!("=================================================");
    println!(" exit after pc={:0>8X}", state.pc());
    Ok(())
}
