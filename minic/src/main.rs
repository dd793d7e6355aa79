use clap::Parser;
use color_print::cprintln;
use emu::console::StdConsole;
use emu::model::State;
use minic::Error;

#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
struct Args {
    /// Input file
    input: String,

    /// Output file
    #[clap(short, long, default_value = "out.asm")]
    output: String,

    /// Print the generated listing
    #[clap(short, long)]
    verbose: bool,

    /// Execute the output on the emulator
    #[clap(long)]
    run: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let source = match std::fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => fail(Error::FileOpen(args.input.clone(), e)),
    };

    let asm = match minic::compile(&args.input, &source) {
        Ok(asm) => asm,
        Err(Error::Diagnostics(diags)) => {
            for diag in &diags {
                diag.print_diag(&args.input, &source);
            }
            cprintln!("<red,bold>error</>: {} error(s) in {}", diags.len(), args.input);
            std::process::exit(1);
        }
        Err(err) => fail(err),
    };

    if args.verbose {
        println!("{}", asm.cformat());
    }
    if let Err(e) = std::fs::write(&args.output, asm.to_string()) {
        fail(Error::FileWrite(args.output.clone(), e));
    }
    cprintln!("<g,bold>wrote</> {}", args.output);

    if args.run {
        let result = emu::loader::load(&asm.to_string()).and_then(|program| {
            let mut console = StdConsole::stdin(false);
            emu::run(State::new(program), &mut console, &mut [], None)
        });
        if let Err(err) = result {
            cprintln!("<red,bold>runtime error</>: {}", err);
            std::process::exit(1);
        }
    }
}

fn fail(err: Error) -> ! {
    cprintln!("<red,bold>error</>: {}", err);
    std::process::exit(1);
}
