use std::fs::File;
use std::io::{self, BufRead};
use log::warn;
use regex::Regex;
use crate::hierarchy::Operation;

/// One decoded trace line. The size is carried for reporting only, the simulator ignores it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub operation: Operation,
    pub address: u64,
    pub size: u32,
}

/// Opens a trace file for sequential line reads
pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // 4096 is the standard block size (or a multiple of it) on most systems
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // Safety: the trace is only read, and is expected not to be modified while the simulation runs
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(m))
        }
    }
}

/// Parses lines of the form `<op> <hex address>,<size>`, e.g. ` L 7ff000398,8`
///
/// Leading whitespace and a `0x` prefix are accepted
pub struct TraceParser {
    pattern: Regex,
}

/// The result of parsing one trace line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Entry(TraceEntry),
    /// Well formed, but not a data reference (e.g. an instruction fetch)
    Ignored,
    Malformed,
}

impl TraceParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(r"^\s*(?P<op>[A-Za-z])\s+(?:0[xX])?(?P<address>[0-9a-fA-F]+)\s*,\s*(?P<size>[0-9]+)\s*$")?,
        })
    }

    pub fn parse_line(&self, line: &str) -> ParsedLine {
        let Some(captures) = self.pattern.captures(line) else {
            return ParsedLine::Malformed;
        };
        let op = captures["op"].chars().next();
        let address = u64::from_str_radix(&captures["address"], 16);
        let size = captures["size"].parse::<u32>();
        match (op, address, size) {
            (Some(op), Ok(address), Ok(size)) => match Operation::from_char(op) {
                Some(operation) => ParsedLine::Entry(TraceEntry { operation, address, size }),
                None => ParsedLine::Ignored,
            },
            _ => ParsedLine::Malformed,
        }
    }
}

/// Iterates over the data references in a trace, skipping everything else
pub struct TraceReader<B: BufRead> {
    reader: B,
    parser: TraceParser,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<B: BufRead> TraceReader<B> {
    pub fn new(reader: B) -> Result<Self, regex::Error> {
        Ok(Self {
            reader,
            parser: TraceParser::new()?,
            buffer: Vec::new(),
            line_number: 0,
        })
    }
}

impl<B: BufRead> Iterator for TraceReader<B> {
    type Item = io::Result<TraceEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.line_number += 1;
            // Bytes which aren't text are a malformed line, not a read failure
            let parsed = match std::str::from_utf8(&self.buffer) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.parser.parse_line(line),
                Err(_) => ParsedLine::Malformed,
            };
            match parsed {
                ParsedLine::Entry(entry) => return Some(Ok(entry)),
                ParsedLine::Ignored => {}
                ParsedLine::Malformed => {
                    warn!(
                        "skipping malformed trace line {}: {:?}",
                        self.line_number,
                        String::from_utf8_lossy(&self.buffer).trim_end()
                    );
                }
            }
        }
    }
}
