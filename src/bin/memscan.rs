//! Thin non-interactive CLI over `memscan_core`, structured after the
//! teacher's `idb-tools` binary: one `clap::Subcommand` variant per
//! operation, each dispatching to a small free function.
//!
//! There is no persisted session: `search` and `filter` read/write a hit
//! list as a flat text file the caller names explicitly, rather than the
//! binary remembering state between invocations. The file stores only
//! address and type per hit — never a value, which is always re-read from
//! the target when it's needed (spec.md §3).

use std::cell::Cell;
use std::fs;
use std::io::Write as _;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use memscan_core::ast::Node;
use memscan_core::config::ScanConfig;
use memscan_core::eval::{eval, Environment};
use memscan_core::hit::{Hit, HitSet};
use memscan_core::scanner::{scan, CancellationFlag};
use memscan_core::symbol::SymbolTable;
use memscan_core::target::linux::LinuxTarget;
use memscan_core::target::{BreakLease, Target};
use memscan_core::{filter as core_filter, AddrWidth, CoreError, Value, ValueType};

#[derive(Parser)]
#[command(name = "memscan", about = "Inspect and scan a live process's memory")]
struct Args {
    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand)]
enum Operation {
    /// Verify a process can be attached to.
    Attach { pid: i32 },
    /// List the target's mapped memory regions.
    Regions { pid: i32 },
    /// Evaluate a constant expression (no target required).
    Eval { expression: String },
    /// Scan every readable region for addresses matching an expression.
    /// The reserved identifiers `value` and `addr` are bound to each
    /// candidate's value and address in turn.
    Search {
        pid: i32,
        #[arg(value_enum)]
        ty: ScalarTypeArg,
        expression: String,
        #[arg(long)]
        out: Option<String>,
        #[arg(long, default_value_t = 65536)]
        block_size: usize,
    },
    /// Re-read a previous hit list and keep only the addresses whose
    /// current value still satisfies an expression (`value`/`addr` bound
    /// to the freshly re-read candidate, same as `search`).
    Filter {
        pid: i32,
        #[arg(long)]
        input: String,
        expression: String,
        #[arg(long)]
        out: Option<String>,
    },
    /// Print a hit list file, re-reading each address's current value.
    List { pid: i32, input: String },
    /// Read one typed value from an address.
    Peek {
        pid: i32,
        #[arg(value_enum)]
        ty: ScalarTypeArg,
        address: String,
    },
    /// Write one typed value to an address.
    Poke {
        pid: i32,
        #[arg(value_enum)]
        ty: ScalarTypeArg,
        address: String,
        value: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ScalarTypeArg {
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    S64,
    U64,
    F32,
    F64,
}

impl From<ScalarTypeArg> for memscan_core::ScalarType {
    fn from(v: ScalarTypeArg) -> Self {
        use memscan_core::ScalarType::*;
        match v {
            ScalarTypeArg::S8 => S8,
            ScalarTypeArg::U8 => U8,
            ScalarTypeArg::S16 => S16,
            ScalarTypeArg::U16 => U16,
            ScalarTypeArg::S32 => S32,
            ScalarTypeArg::U32 => U32,
            ScalarTypeArg::S64 => S64,
            ScalarTypeArg::U64 => U64,
            ScalarTypeArg::F32 => F32,
            ScalarTypeArg::F64 => F64,
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args.operation) {
        eprintln!("error: {err:#}");
        let code = err
            .downcast_ref::<CoreError>()
            .map(|e| e.exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(op: &Operation) -> Result<()> {
    match op {
        Operation::Attach { pid } => attach(*pid),
        Operation::Regions { pid } => regions(*pid),
        Operation::Eval { expression } => eval_cmd(expression),
        Operation::Search { pid, ty, expression, out, block_size } => {
            search(*pid, (*ty).into(), expression, out.as_deref(), *block_size)
        }
        Operation::Filter { pid, input, expression, out } => {
            filter_cmd(*pid, input, expression, out.as_deref())
        }
        Operation::List { pid, input } => list(*pid, input),
        Operation::Peek { pid, ty, address } => peek(*pid, (*ty).into(), address),
        Operation::Poke { pid, ty, address, value } => poke(*pid, (*ty).into(), address, value),
    }
}

fn attach(pid: i32) -> Result<()> {
    LinuxTarget::attach(pid).context("attach failed")?;
    println!("attached to {pid}");
    Ok(())
}

fn regions(pid: i32) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    for region in target.regions()? {
        println!(
            "{:016x}-{:016x} {}{}{} {}",
            region.start,
            region.end(),
            if region.readable { 'r' } else { '-' },
            if region.writable { 'w' } else { '-' },
            if region.executable { 'x' } else { '-' },
            region.path.unwrap_or_default(),
        );
    }
    Ok(())
}

struct NoVariables;

impl Environment for NoVariables {
    fn read(&self, _address: u64, _ty: &ValueType) -> Result<Value, CoreError> {
        Err(CoreError::Eval("expression referenced a variable with no attached target".into()))
    }
}

fn eval_cmd(expression: &str) -> Result<()> {
    // No target is attached, so there's no address width to determine;
    // 64-bit is the harmless default for a standalone constant expression.
    let node = memscan_core::compile(expression, &SymbolTable::new(), AddrWidth::W64)?;
    let value = eval(&node, &NoVariables)?;
    println!("{value}");
    Ok(())
}

/// Slot addresses `CandidateEnvironment` recognizes; never real target
/// addresses, just tags distinguishing which reserved identifier a
/// `Node::Variable` read resolves to.
const VALUE_SLOT: u64 = 0;
const ADDR_SLOT: u64 = 1;

/// Builds the symbol table a `search`/`filter` expression evaluates
/// against: the reserved `value` and `addr` identifiers (spec.md §4.6,
/// §6), `addr` typed to the address width fixed for this scan.
fn candidate_symbols(ty: memscan_core::ScalarType, width: AddrWidth) -> SymbolTable {
    let mut symbols = SymbolTable::new();
    symbols.insert(memscan_core::symbol::Symbol {
        name: "value".into(),
        ty: ValueType::Scalar(ty),
        address: VALUE_SLOT,
    });
    symbols.insert(memscan_core::symbol::Symbol {
        name: "addr".into(),
        ty: ValueType::Scalar(width.as_unsigned()),
        address: ADDR_SLOT,
    });
    symbols
}

struct CandidateEnvironment {
    address: u64,
    value: Value,
}

impl Environment for CandidateEnvironment {
    fn read(&self, address: u64, ty: &ValueType) -> Result<Value, CoreError> {
        match address {
            VALUE_SLOT => Ok(self.value),
            ADDR_SLOT => Ok(Value::U64(self.address).cast(ty)),
            _ => Err(CoreError::Eval("expression referenced a variable with no attached target".into())),
        }
    }
}

fn matches_predicate(node: &Node, address: u64, candidate: Value) -> bool {
    eval(node, &CandidateEnvironment { address, value: candidate })
        .map(|v| !v.is_zero())
        .unwrap_or(false)
}

fn search(
    pid: i32,
    ty: memscan_core::ScalarType,
    expression: &str,
    out: Option<&str>,
    block_size: usize,
) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    // The address width must be fixed once, before compiling — the same
    // decision the scan loop itself uses to promote its own addressing
    // (spec.md §4.6) — not re-derived afterward.
    let width = AddrWidth::of_target(&target);
    let symbols = candidate_symbols(ty, width);
    let node = memscan_core::compile(expression, &symbols, width)?;
    let config = ScanConfig { block_size, ..ScanConfig::default() };
    let cancel = CancellationFlag::new();

    let hits = scan(&target, &ValueType::Scalar(ty), &config, width, &cancel, |addr, candidate| {
        matches_predicate(&node, addr, *candidate)
    })?;

    write_hits(&hits.with_predicate(node), out)
}

fn filter_cmd(pid: i32, input: &str, expression: &str, out: Option<&str>) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    let hits = read_hits(input)?;
    let ValueType::Scalar(scalar) = hits.ty().clone() else {
        bail!("filtering pointer hit sets is not supported");
    };
    let width = AddrWidth::of_target(&target);
    let symbols = candidate_symbols(scalar, width);
    let node = memscan_core::compile(expression, &symbols, width)?;

    let filtered = core_filter::filter(&target, &hits, |address, current| {
        matches_predicate(&node, address, *current)
    })?;
    write_hits(&filtered.with_predicate(node), out)
}

fn list(pid: i32, input: &str) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    let hits = read_hits(input)?;
    for hit in hits.iter() {
        let value = hit.read(&target)?;
        println!("{:#x} {}", hit.address, value);
    }
    Ok(())
}

fn peek(pid: i32, ty: memscan_core::ScalarType, address: &str) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    let _lease = BreakLease::acquire(&target, Rc::new(Cell::new(0)))?;
    let address = parse_address(address)?;
    let ty = ValueType::Scalar(ty);
    let bytes = target.read(address, ty.byte_width() as usize)?;
    let value = Value::from_le_bytes(&ty, &bytes)?;
    println!("{value}");
    Ok(())
}

fn poke(pid: i32, ty: memscan_core::ScalarType, address: &str, value: &str) -> Result<()> {
    let target = LinuxTarget::attach(pid).context("attach failed")?;
    let _lease = BreakLease::acquire(&target, Rc::new(Cell::new(0)))?;
    let address = parse_address(address)?;
    let width = AddrWidth::of_target(&target);
    let symbols = SymbolTable::new();
    let node = memscan_core::compile(value, &symbols, width)?;
    let v = eval(&node, &NoVariables)?.cast(&ValueType::Scalar(ty));
    target.write(address, &v.to_le_bytes())?;
    Ok(())
}

fn parse_address(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse()?)
    }
}

fn write_hits(hits: &HitSet, out: Option<&str>) -> Result<()> {
    let mut buf = String::new();
    for hit in hits.iter() {
        buf.push_str(&format!("{:#x} {}\n", hit.address, hit.ty));
    }
    match out {
        Some(path) => fs::File::create(path)?.write_all(buf.as_bytes())?,
        None => print!("{buf}"),
    }
    Ok(())
}

fn read_hits(path: &str) -> Result<HitSet> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let mut hits = Vec::new();
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        let mut parts = line.split_whitespace();
        let address = parse_address(parts.next().context("missing address field")?)?;
        let ty_name = parts.next().context("missing type field")?;
        let scalar = memscan_core::ScalarType::from_name(ty_name)
            .with_context(|| format!("unknown type '{ty_name}' in {path}"))?;
        hits.push(Hit { address, ty: ValueType::Scalar(scalar) });
    }
    let ty = hits
        .first()
        .map(|h| h.ty.clone())
        .unwrap_or(ValueType::Scalar(memscan_core::ScalarType::S32));
    Ok(HitSet::new(ty, hits))
}
