//! 棋譜ファイルを読み、各棋譜の戦型を判定して出力する。
//!
//! ファイルは 1 行 1 棋譜 (`startpos moves ...` など)。ファイルを指定しなければ標準入力から読む。

use std::io::Read;
use std::path::PathBuf;

use either::Either;
use eyre::eyre;
use rayon::prelude::*;
use structopt::StructOpt;

use senkei::analyzer::{self, Classification};
use senkei::log::{Log, Logger};
use senkei::predicate;
use senkei::prelude::*;
use senkei::record::{self, Record};
use senkei::trace::Tracker;
use senkei::tree;

#[derive(Debug, StructOpt)]
struct Opt {
    /// 日本語の戦型名を出力する
    #[structopt(long)]
    ja: bool,

    /// 分類木の遷移を出力する
    #[structopt(long)]
    events: bool,

    /// 判定終了時点の述語の値を出力する
    #[structopt(long)]
    predicates: bool,

    /// 判定終了時点の局面と駒の軌跡を出力する
    #[structopt(long)]
    board: bool,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    /// コマンドラインで与える棋譜
    #[structopt(long)]
    sfen: Option<String>,

    #[structopt(parse(from_os_str))]
    files: Vec<PathBuf>,
}

struct Output {
    source: String,
    res: Classification,
    tracker: Tracker,
    log: Log,
}

fn main() -> eyre::Result<()> {
    let opt = Opt::from_args();

    init_logger(opt.verbose)?;

    let inputs = load_records(&opt)?;
    log::info!("{} records", inputs.len());

    let outputs = inputs
        .into_par_iter()
        .map(|(source, record)| {
            let mut logger = Logger::new();
            let (res, tracker) = analyzer::analyze(tree::tree(), record.moves(), &mut logger)?;
            Ok(Output {
                source,
                res,
                tracker,
                log: logger.into_log(),
            })
        })
        .collect::<senkei::Result<Vec<_>>>()?;

    for output in outputs.iter() {
        print_output(&opt, output);
    }

    Ok(())
}

fn init_logger(verbose: u8) -> eyre::Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

/// (出所, 棋譜) のリストを読み込む。
fn load_records(opt: &Opt) -> eyre::Result<Vec<(String, Record)>> {
    let mut res = Vec::new();

    if let Some(sfen) = &opt.sfen {
        let record = sfen
            .parse::<Record>()
            .map_err(|e| eyre!("--sfen: {}", e))?;
        res.push(("--sfen".to_owned(), record));
    }

    let sources = if opt.files.is_empty() && opt.sfen.is_none() {
        Either::Left(std::iter::once(None))
    } else {
        Either::Right(opt.files.iter().map(Some))
    };

    for path in sources {
        let (name, records) = match path {
            Some(path) => {
                let records = record::read_file(path)
                    .map_err(|e| eyre!("{}: {}", path.display(), e))?;
                (path.display().to_string(), records)
            }
            None => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                ("<stdin>".to_owned(), record::parse_many(&text)?)
            }
        };
        res.extend(
            records
                .into_iter()
                .enumerate()
                .map(|(i, record)| (format!("{}#{}", name, i + 1), record)),
        );
    }

    Ok(res)
}

fn print_output(opt: &Opt, output: &Output) {
    let res = &output.res;

    let label = if opt.ja { res.label_ja() } else { res.label() };
    match res.stopped_at {
        Some(i) => println!("{}\t{}\t{}\tillegal move at {}", output.source, label, res.ply, i + 1),
        None => println!("{}\t{}\t{}", output.source, label, res.ply),
    }

    if opt.events {
        print!("{}", output.log.pretty());
    }

    if opt.predicates {
        for def in predicate::ALL {
            let values: Vec<_> = Side::iter()
                .map(|side| def.eval(&output.tracker, side))
                .collect();
            println!("  {:<24} {:>3} {:>3}", def.name, values[0], values[1]);
        }
    }

    if opt.board {
        print!("{}", output.tracker.pretty());
    }
}
