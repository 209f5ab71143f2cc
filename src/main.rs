use structopt::StructOpt;

use elementc::ast::Program;
use elementc::error::{Error, SourceMetadata};
use elementc::grammar::Parser;
use elementc::{ir, semantic, treedump};

use itertools::Itertools;
use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Fallback program compiled when no file is given, the same snippet the
/// language is usually demonstrated with.
static SAMPLE_PROGRAM: &str = r#"I idade;
idade = 17;
Au (idade >= 18) {
    P("Maior de idade");
} Cu {
    P("Menor de idade");
}
"#;

fn run() -> Result<(), anyhow::Error> {
    use std::fs;
    use std::io::Write;

    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "ELEMENTC_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let (source, filename) = match opt.file {
        Some(file) => (fs::read_to_string(&file)?, file),
        None => (
            SAMPLE_PROGRAM.to_string(),
            std::path::PathBuf::from("sample.elem"),
        ),
    };
    let tree_file = opt.tree.unwrap_or_else(|| "arvore.json".into());
    let out_file = opt.output.unwrap_or_else(|| filename.with_extension("ll"));
    let meta = SourceMetadata::new(&source).with_file(filename);

    println!("=== source ===\n");
    println!("{}", source);

    let program: Program = match Parser::new(&meta).parse() {
        Ok(program) => program,
        Err(e) => {
            let stage = if e.kind.is_lexical() {
                "lexical"
            } else {
                "syntax"
            };
            println!("=== error report ===\n");
            println!("[{} error]\n{}", stage, e);
            anyhow::bail!("aborting: the program could not be parsed");
        }
    };
    log::debug!("parsed program: {program:?}");

    fs::write(
        &tree_file,
        serde_json::to_string_pretty(&treedump::program_to_json(&program))?,
    )?;
    println!("syntax tree written to {}", tree_file.display());

    let semantic_errors = semantic::analyze(&program);

    println!("\n=== error report ===\n");
    if semantic_errors.is_empty() {
        println!("[ok] no errors found");
    } else {
        println!(
            "{}",
            semantic_errors
                .iter()
                .map(|e| Error::new(e.kind.clone()).with_source(e.span, &meta))
                .format("\n")
        );
    }

    if !semantic_errors.is_empty() {
        anyhow::bail!(
            "code not generated: {} semantic error(s) outstanding",
            semantic_errors.len()
        );
    }

    let code = ir::generate::generate_program(&program, semantic_errors.len())?;
    let mut file = fs::File::create(&out_file)?;
    for instruction in &code {
        writeln!(file, "{}", instruction)?;
    }
    println!("\nintermediate code written to {}", out_file.display());

    Ok(())
}

#[derive(Debug, StructOpt)]
struct Opt {
    /// The file to compile; compiles a built-in sample program when omitted
    #[structopt(parse(from_os_str))]
    file: Option<std::path::PathBuf>,
    /// The (optional) output file for the generated intermediate code
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<std::path::PathBuf>,
    /// Where to write the syntax tree dump
    #[structopt(long = "tree", parse(from_os_str))]
    tree: Option<std::path::PathBuf>,
}
