use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bio::io::fasta;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use blastcore::align::{MatrixType, NwAligner, TextFormat};
use blastcore::common::{hits_from_results, write_output};
use blastcore::core::{ExtensionMethod, Program, SearchEngine, SearchOptions};
use blastcore::sequence::{Alphabet, InMemorySource, Sequence};
use blastcore::utils::seg::SegParams;

#[derive(Parser)]
#[command(name = "blastcore")]
#[command(version = "0.1.0")]
#[command(about = "Seed-and-extend sequence search and global pairwise alignment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search query sequences against a set of subject sequences
    Search(SearchArgs),

    /// Global (Needleman-Wunsch) alignment of two sequences
    Align(AlignArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgramArg {
    Blastn,
    Blastp,
    Blastx,
    Tblastn,
    Tblastx,
}

impl From<ProgramArg> for Program {
    fn from(p: ProgramArg) -> Self {
        match p {
            ProgramArg::Blastn => Program::Blastn,
            ProgramArg::Blastp => Program::Blastp,
            ProgramArg::Blastx => Program::Blastx,
            ProgramArg::Tblastn => Program::Tblastn,
            ProgramArg::Tblastx => Program::Tblastx,
        }
    }
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(short, long, value_enum)]
    program: ProgramArg,
    #[arg(short, long)]
    query: PathBuf,
    #[arg(short, long)]
    subject: PathBuf,
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Use megablast word size and scoring (blastn only)
    #[arg(long, default_value_t = false)]
    megablast: bool,
    #[arg(short, long)]
    word_size: Option<usize>,
    /// Neighboring word score threshold (protein lookups)
    #[arg(long)]
    threshold: Option<i32>,
    /// Two-hit window (0 = one-hit seeding)
    #[arg(long)]
    window_size: Option<usize>,
    #[arg(long)]
    matrix: Option<String>,
    #[arg(long)]
    reward: Option<i32>,
    #[arg(long)]
    penalty: Option<i32>,
    #[arg(long)]
    gap_open: Option<i32>,
    #[arg(long)]
    gap_extend: Option<i32>,
    #[arg(long)]
    evalue: Option<f64>,
    #[arg(long)]
    hitlist_size: Option<usize>,
    /// Skip gapped extension and traceback
    #[arg(long, default_value_t = false)]
    ungapped: bool,
    /// Allow frame shifts in gapped extension (blastx, tblastn)
    #[arg(long, default_value_t = false)]
    out_of_frame: bool,
    #[arg(long)]
    frame_shift_penalty: Option<i32>,
    /// Extend around the ungapped seed instead of from its gapped start
    #[arg(long, default_value_t = false)]
    anchored: bool,
    /// Mask low-complexity query regions: DUST for blastn, SEG otherwise
    /// (default: on for blastn, off for the rest)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    filter: Option<bool>,
    #[arg(long)]
    dust_level: Option<u32>,
    #[arg(long)]
    dust_window: Option<usize>,
    #[arg(long)]
    dust_linker: Option<usize>,
    #[arg(long)]
    seg_window: Option<usize>,
    #[arg(long)]
    seg_locut: Option<f64>,
    #[arg(long)]
    seg_hicut: Option<f64>,
    /// Worker threads (0 = all cores)
    #[arg(short = 'n', long, default_value_t = 0)]
    num_threads: usize,
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Type1,
    Type2,
    Fasta,
    Segments,
}

#[derive(Args, Debug)]
struct AlignArgs {
    seq1: PathBuf,
    seq2: PathBuf,
    /// Score with BLOSUM62 instead of match/mismatch
    #[arg(long, default_value_t = false)]
    protein: bool,
    /// Free end gaps as four 0/1 flags: left1 right1 left2 right2
    #[arg(long, default_value = "0000")]
    esf: String,
    /// match,mismatch,gap_open,gap_extend
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    scores: Option<Vec<i32>>,
    /// Diagonal band width
    #[arg(long)]
    band: Option<usize>,
    #[arg(long, value_enum, default_value_t = FormatArg::Type2)]
    format: FormatArg,
    #[arg(long, default_value_t = 60)]
    line_width: usize,
    #[arg(long, short = 'v', default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn read_fasta(path: &Path, alphabet: Alphabet) -> Result<Vec<Sequence>> {
    let reader = fasta::Reader::from_file(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut sequences = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed FASTA in {}", path.display()))?;
        let sequence = Sequence::new(record.id(), record.seq(), alphabet)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        sequences.push(sequence);
    }
    Ok(sequences)
}

fn search_options(args: &SearchArgs) -> SearchOptions {
    let program = Program::from(args.program);
    let mut options = if args.megablast && program == Program::Blastn {
        SearchOptions::megablast()
    } else {
        SearchOptions::for_program(program)
    };

    if let Some(v) = args.word_size {
        options.word_size = v;
    }
    if let Some(v) = args.threshold {
        options.word_threshold = v;
    }
    if let Some(v) = args.window_size {
        options.window_size = v;
    }
    if let Some(v) = &args.matrix {
        options.matrix_name = v.clone();
    }
    if let Some(v) = args.reward {
        options.reward = v;
    }
    if let Some(v) = args.penalty {
        options.penalty = v;
    }
    if let Some(v) = args.gap_open {
        options.gap_open = v;
    }
    if let Some(v) = args.gap_extend {
        options.gap_extend = v;
    }
    if let Some(v) = args.evalue {
        options.evalue_threshold = v;
    }
    if let Some(v) = args.hitlist_size {
        options.hitlist_size = v;
    }
    if let Some(v) = args.frame_shift_penalty {
        options.frame_shift_penalty = v;
    }
    if args.ungapped {
        options.gapped = false;
    }
    if let Some(v) = args.filter {
        options.mask_low_complexity = v;
    }
    if let Some(v) = args.dust_level {
        options.dust.level = v;
    }
    if let Some(v) = args.dust_window {
        options.dust.window = v;
    }
    if let Some(v) = args.dust_linker {
        options.dust.linker = v;
    }
    if args.seg_window.is_some() || args.seg_locut.is_some() || args.seg_hicut.is_some() {
        options.seg = SegParams::new(
            args.seg_window.unwrap_or(options.seg.window),
            args.seg_locut.unwrap_or(options.seg.locut),
            args.seg_hicut.unwrap_or(options.seg.hicut),
        );
    }
    if args.out_of_frame {
        options.out_of_frame = true;
    }
    if args.anchored {
        options.extension_method = ExtensionMethod::Greedy;
    }
    options.num_threads = if args.num_threads == 0 {
        num_cpus::get()
    } else {
        args.num_threads
    };
    options
}

fn run_search(args: SearchArgs) -> Result<()> {
    init_logging(args.verbose);
    let options = search_options(&args);
    let program = options.program;

    let queries = read_fasta(&args.query, program.query_alphabet())?;
    let subjects = read_fasta(&args.subject, program.subject_alphabet())?;
    info!("{} queries, {} subjects", queries.len(), subjects.len());

    let query_lengths: Vec<usize> = queries.iter().map(Sequence::len).collect();
    let engine = SearchEngine::new(options, &queries).context("Failed to set up the search")?;
    let source = InMemorySource::new(subjects);

    let bar = ProgressBar::new(source.sequences().len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?,
    );
    let outcome = engine
        .search_with_progress(&source, &|n| bar.inc(n as u64))
        .context("Search failed")?;
    bar.finish_and_clear();

    if outcome.warnings > 0 {
        info!("{} HSPs were dropped during traceback", outcome.warnings);
    }

    let subjects = source.sequences();
    let hits = hits_from_results(program, &outcome.results, &query_lengths, |oid| {
        let s = &subjects[oid];
        (s.id().to_string(), s.len())
    });
    write_output(&hits, args.out.as_ref())
}

fn parse_esf(flags: &str) -> Result<[bool; 4]> {
    let bytes = flags.as_bytes();
    if bytes.len() != 4 || bytes.iter().any(|b| *b != b'0' && *b != b'1') {
        bail!("--esf takes four 0/1 flags, got '{flags}'");
    }
    Ok([bytes[0] == b'1', bytes[1] == b'1', bytes[2] == b'1', bytes[3] == b'1'])
}

fn first_record(path: &Path, alphabet: Alphabet) -> Result<Sequence> {
    read_fasta(path, alphabet)?
        .into_iter()
        .next()
        .with_context(|| format!("No sequence in {}", path.display()))
}

fn run_align(args: AlignArgs) -> Result<()> {
    init_logging(args.verbose);
    let (matrix_type, alphabet) = if args.protein {
        (MatrixType::Blosum62, Alphabet::Protein)
    } else {
        (MatrixType::Nucleotide, Alphabet::Nucleotide)
    };
    let seq1 = first_record(&args.seq1, alphabet)?;
    let seq2 = first_record(&args.seq2, alphabet)?;
    let esf = parse_esf(&args.esf)?;

    let text1 = seq1.to_text();
    let text2 = seq2.to_text();
    let mut aligner = NwAligner::new(text1.as_bytes(), text2.as_bytes(), matrix_type)?;
    aligner.set_end_space_free(esf[0], esf[1], esf[2], esf[3]);
    if let Some(s) = &args.scores {
        aligner.set_scores(s[0], s[1], s[2], s[3]);
    }
    aligner.set_band(args.band)?;
    let score = aligner.run().context("Alignment failed")?;

    println!("# {} vs {}", seq1.id(), seq2.id());
    println!("# score {score}");
    match args.format {
        FormatArg::Type1 => print!("{}", aligner.format_as_text(TextFormat::Type1, args.line_width)?),
        FormatArg::Type2 => print!("{}", aligner.format_as_text(TextFormat::Type2, args.line_width)?),
        FormatArg::Fasta => print!("{}", aligner.format_as_text(TextFormat::FastA, args.line_width)?),
        FormatArg::Segments => {
            for seg in aligner.format_as_segments() {
                let show = |v: Option<usize>| v.map_or("-".to_string(), |x| x.to_string());
                println!("{}\t{}\t{}", show(seg.start1), show(seg.start2), seg.len);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(args),
        Commands::Align(args) => run_align(args),
    }
}
