use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use gts::io::{DataSink, DataSource, FileType, SeqStream};
use gts::operations;
use gts::seq::Selector;
use gts::Sequence;

#[derive(Parser, Debug)]
#[command(name = "gts", version, about = "Tools for annotated sequence records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct OutputOpts {
    /// Output sequence file (`-` means standard output).
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
    /// Force the output file format (defaults to the output extension).
    #[arg(short = 'F', long)]
    format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report the length of the input sequence(s).
    Length {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        /// Output table file (`-` means standard output).
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// Insert a guest sequence into the input sequence(s).
    Insert {
        /// Zero-indexed position to insert the guest sequence at.
        position: usize,
        /// Guest sequence file.
        guest: PathBuf,
        /// Host sequence file (standard input if omitted).
        input: Option<PathBuf>,
        /// Extend feature locations over the insertion instead of splitting them.
        #[arg(short, long)]
        embed: bool,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Delete a region of the input sequence(s).
    Delete {
        /// Zero-indexed position to start deleting from.
        position: usize,
        /// Number of bases to delete.
        length: usize,
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Reverse the order of the input sequence(s).
    Reverse {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Compute the IUPAC complement of the input sequence(s).
    Complement {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Shift the coordinates of circular sequence(s).
    Rotate {
        /// Number of bases to rotate by.
        #[arg(allow_hyphen_values = true)]
        amount: isize,
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        /// Rotate backwards (equivalent to a negative amount).
        #[arg(short = 'v', long)]
        backward: bool,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Remove all features except source features.
    Clear {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Select features matching a selector expression.
    Select {
        /// Feature selector (syntax: `key[/qualifier[=regexp]]...`).
        selector: String,
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        /// Keep the features that do not match.
        #[arg(short = 'v', long)]
        invert_match: bool,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Merge features from a feature table file into the sequence(s).
    Annotate {
        /// Feature table file with the features to merge.
        feature_table: PathBuf,
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
    /// Extract feature keys, locations, and qualifier values as a table.
    Extract {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        /// Output table file (`-` means standard output).
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
        /// Qualifier name(s) to extract (repeatable).
        #[arg(short, long)]
        name: Vec<String>,
        /// String inserted between columns.
        #[arg(short, long, default_value = "\t")]
        delimiter: String,
        /// String inserted between multiple qualifier values.
        #[arg(short = 't', long, default_value = ",")]
        separator: String,
        /// Do not extract the feature key.
        #[arg(long)]
        no_key: bool,
        /// Do not extract the feature location.
        #[arg(long)]
        no_location: bool,
        /// Extract rows even when a requested qualifier is missing.
        #[arg(long)]
        empty: bool,
    },
    /// Write the sequences referenced by the features.
    Seq {
        /// Input sequence file (standard input if omitted).
        input: Option<PathBuf>,
        #[command(flatten)]
        out: OutputOpts,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Length { .. } => "length",
            Commands::Insert { .. } => "insert",
            Commands::Delete { .. } => "delete",
            Commands::Reverse { .. } => "reverse",
            Commands::Complement { .. } => "complement",
            Commands::Rotate { .. } => "rotate",
            Commands::Clear { .. } => "clear",
            Commands::Select { .. } => "select",
            Commands::Annotate { .. } => "annotate",
            Commands::Extract { .. } => "extract",
            Commands::Seq { .. } => "seq",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let name = cli.command.name();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gts {name}: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Length { input, output } => run_length(input.as_deref(), &output),
        Commands::Insert {
            position,
            guest,
            input,
            embed,
            out,
        } => run_insert(position, &guest, input.as_deref(), embed, &out),
        Commands::Delete {
            position,
            length,
            input,
            out,
        } => run_each(input.as_deref(), &out, |seq| {
            Ok(operations::delete(seq, position, length)?)
        }),
        Commands::Reverse { input, out } => {
            run_each(input.as_deref(), &out, |seq| Ok(operations::reverse(seq)))
        }
        Commands::Complement { input, out } => {
            run_each(input.as_deref(), &out, |seq| Ok(operations::complement(seq)))
        }
        Commands::Rotate {
            amount,
            input,
            backward,
            out,
        } => {
            let amount = if backward { -amount } else { amount };
            run_each(input.as_deref(), &out, move |seq| {
                Ok(operations::rotate(seq, amount)?)
            })
        }
        Commands::Clear { input, out } => run_each(input.as_deref(), &out, |seq| {
            Ok(seq.set_features(seq.features().filter(&Selector::source())))
        }),
        Commands::Select {
            selector,
            input,
            invert_match,
            out,
        } => {
            let mut filter = Selector::parse(&selector)?;
            if invert_match {
                filter = filter.not();
            }
            let filter = Selector::source().or(filter);
            run_each(input.as_deref(), &out, move |seq| {
                Ok(seq.set_features(seq.features().filter(&filter)))
            })
        }
        Commands::Annotate {
            feature_table,
            input,
            out,
        } => run_annotate(&feature_table, input.as_deref(), &out),
        Commands::Extract {
            input,
            output,
            name,
            delimiter,
            separator,
            no_key,
            no_location,
            empty,
        } => run_extract(
            input.as_deref(),
            &output,
            &name,
            &delimiter,
            &separator,
            no_key,
            no_location,
            empty,
        ),
        Commands::Seq { input, out } => run_seq(input.as_deref(), &out),
    }
}

/// Open the input as an auto-detecting record stream.
fn open_records(input: Option<&Path>) -> Result<SeqStream<Box<dyn BufRead>>> {
    let source = DataSource::from_arg(input);
    let reader = source.open().with_context(|| match input {
        Some(path) => format!("failed to open file {}", path.display()),
        None => "failed to open standard input".to_string(),
    })?;
    Ok(SeqStream::new(reader)?)
}

/// Open the output sink and resolve the output format.
fn open_sink(out: &OutputOpts) -> Result<(BufWriter<Box<dyn Write>>, FileType)> {
    let sink = DataSink::from_arg(&out.output);
    let filetype = match &out.format {
        Some(name) => FileType::from_name(name)?,
        None => FileType::from_extension(sink.extension()),
    };
    let writer = sink
        .create()
        .with_context(|| format!("failed to create file {}", out.output.display()))?;
    Ok((BufWriter::new(writer), filetype))
}

/// Apply one operation per input record and write the results.
fn run_each(
    input: Option<&Path>,
    out: &OutputOpts,
    op: impl Fn(&Sequence) -> Result<Sequence>,
) -> Result<()> {
    let (mut writer, filetype) = open_sink(out)?;
    for record in open_records(input)? {
        let record = record?;
        let record = op(&record)?;
        filetype.write_record(&mut writer, &record)?;
    }
    writer.flush()?;
    Ok(())
}

fn run_length(input: Option<&Path>, output: &Path) -> Result<()> {
    let mut writer = BufWriter::new(
        DataSink::from_arg(output)
            .create()
            .with_context(|| format!("failed to create file {}", output.display()))?,
    );
    for record in open_records(input)? {
        writeln!(writer, "{}", record?.len())?;
    }
    writer.flush()?;
    Ok(())
}

fn run_insert(
    position: usize,
    guest: &Path,
    input: Option<&Path>,
    embed: bool,
    out: &OutputOpts,
) -> Result<()> {
    let guests: Vec<Sequence> = open_records(Some(guest))?
        .collect::<gts::Result<_>>()
        .with_context(|| format!("failed to read guest sequences from {}", guest.display()))?;
    if guests.is_empty() {
        bail!(
            "guest sequence file {} does not contain a sequence",
            guest.display()
        );
    }

    let (mut writer, filetype) = open_sink(out)?;
    for host in open_records(input)? {
        let host = host?;
        for guest in &guests {
            let product = if embed {
                operations::embed(&host, position, guest)?
            } else {
                operations::insert(&host, position, guest)?
            };
            filetype.write_record(&mut writer, &product)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn run_annotate(feature_table: &Path, input: Option<&Path>, out: &OutputOpts) -> Result<()> {
    let text = std::fs::read_to_string(feature_table)
        .with_context(|| format!("failed to open file {}", feature_table.display()))?;
    let table = gts::io::genbank::parse_feature_table(&text)?;

    let (mut writer, filetype) = open_sink(out)?;
    for record in open_records(input)? {
        let record = record?;
        let mut features = record.features().clone();
        for feature in &table {
            features.add(feature.clone());
        }
        filetype.write_record(&mut writer, &record.set_features(features))?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_extract(
    input: Option<&Path>,
    output: &Path,
    names: &[String],
    delimiter: &str,
    separator: &str,
    no_key: bool,
    no_location: bool,
    empty: bool,
) -> Result<()> {
    let mut writer = BufWriter::new(
        DataSink::from_arg(output)
            .create()
            .with_context(|| format!("failed to create file {}", output.display()))?,
    );

    let mut fields: Vec<&str> = Vec::new();
    if !no_key {
        fields.push("feature");
    }
    if !no_location {
        fields.push("location");
    }
    fields.extend(names.iter().map(String::as_str));
    writeln!(writer, "{}", fields.join(delimiter))?;

    for record in open_records(input)? {
        let record = record?;
        for feature in record.features() {
            let mut values: Vec<String> = Vec::new();
            if !no_key {
                values.push(feature.key.clone());
            }
            if !no_location {
                values.push(feature.location.to_string());
            }
            let mut ok = true;
            for name in names {
                let found = feature.qualifiers.values(name);
                if found.is_empty() && !empty {
                    ok = false;
                }
                values.push(found.join(separator));
            }
            if ok {
                writeln!(writer, "{}", values.join(delimiter))?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn run_seq(input: Option<&Path>, out: &OutputOpts) -> Result<()> {
    let (mut writer, filetype) = open_sink(out)?;
    for record in open_records(input)? {
        let record = record?;
        for feature in record.features() {
            if feature.is_source() {
                continue;
            }
            let sub = feature.location.locate(&record);
            filetype.write_record(&mut writer, &sub)?;
        }
    }
    writer.flush()?;
    Ok(())
}
