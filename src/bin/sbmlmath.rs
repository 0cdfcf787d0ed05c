use std::fs;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, ValueEnum};
use sbmlmath::{
    parse_formula, read_math_from_str, to_formula, write_math_to_string, ElementKind, ErrorLog,
    MathElement, MathValidator, Model, ReadOptions, SbmlNamespace, Severity, WriteOptions,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Mathml,
    Formula,
}

/// converts SBML math between MathML and infix formulas, optionally checking it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input MathML filename
    input: Option<String>,

    /// Read an infix formula instead of a MathML file
    #[arg(short, long)]
    formula: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Formula)]
    output: OutputFormat,

    /// SBML level
    #[arg(short, long, default_value_t = 3)]
    level: u32,

    /// SBML version within the level
    #[arg(long, default_value_t = 2)]
    sbml_version: u32,

    /// Run the math consistency checks, treating the math as an assignment rule
    #[arg(short, long)]
    check: bool,

    /// Parameter ids to declare in the model used for checking
    #[arg(short, long, value_delimiter = ',')]
    declare: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Args::parse();
    let namespace = SbmlNamespace::new(cli.level, cli.sbml_version);
    let mut log = ErrorLog::new();

    let math = match (&cli.formula, &cli.input) {
        (Some(text), _) => parse_formula(text)?,
        (None, Some(filename)) => {
            let text = fs::read_to_string(filename)?;
            let options = ReadOptions {
                namespace,
                ..Default::default()
            };
            let math = read_math_from_str(&text, &options, &mut log);
            if log.has_serious() {
                eprint!("{}", log.as_error_message());
                bail!("could not read math from {}", filename);
            }
            math.ok_or_else(|| anyhow!("no math found in {}", filename))?
        }
        (None, None) => bail!("either an input file or --formula is required"),
    };

    if cli.check {
        let mut model = Model::new(namespace);
        for id in &cli.declare {
            model.add_parameter(id);
        }
        let element = MathElement::new(ElementKind::AssignmentRule);
        log.extend(MathValidator::default().validate(&model, [(&element, &math)]));
    }

    match cli.output {
        OutputFormat::Formula => println!("{}", to_formula(&math)),
        OutputFormat::Mathml => {
            let options = WriteOptions {
                namespace,
                ..Default::default()
            };
            println!("{}", write_math_to_string(&math, &options)?);
        }
    }

    if !log.is_empty() {
        eprint!("{}", log.as_error_message());
    }
    if log.iter().any(|err| err.severity() >= Severity::Error) {
        bail!("{} problem(s) found", log.len());
    }
    Ok(())
}
