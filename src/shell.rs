//! Line-oriented command shell over a [`ClusterFs`]
//!
//! Parsing and execution are separate: [`Command::parse`] turns one input
//! line into a [`Command`] without touching the filesystem, and
//! [`Shell::execute`] runs it, writing all user-facing output to an
//! [`io::Write`]. Filesystem errors are reported on the output and never end
//! the session.

use crate::{ClusterFs, Entry, Result};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

pub const PROMPT: &str = "$: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mkdir(String),
    Remove { path: String, recursive: bool },
    List(Option<String>),
    Cd(String),
    Touch { path: String, content: String },
    Less(String),
    SizeOf(String),
    Pwd,
    Stat(String),
    Df,
    Save(String),
    Help,
    Exit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Command not recognised!")]
    Unknown(String),

    #[error("usage: {0}")]
    MissingArgument(&'static str),
}

/// Whether the session continues after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

const HELP: &str = "\
mkdir <path>            create a directory
rm [-r] <path>          remove a file or directory
ls [path]               list a directory
cd <path>               change the working directory
touch <path> [content]  create a file
less <path>             print a file
sizeof <path>           print the size of a file
pwd                     print the working directory
stat <path>             show object metadata
df                      show space usage
save <file>             write the store image to a host file
exit                    leave the shell";

impl Command {
    /// Parse one input line. Blank lines give `Ok(None)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Command>, ParseError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim_start()),
            None => (line, ""),
        };
        let mut args = rest.split_whitespace();

        let command = match name {
            "" => return Ok(None),
            "mkdir" => Command::Mkdir(required(args.next(), "mkdir <path>")?),
            "rm" => {
                let mut recursive = false;
                let mut path = args.next();
                if path == Some("-r") {
                    recursive = true;
                    path = args.next();
                }
                Command::Remove {
                    path: required(path, "rm [-r] <path>")?,
                    recursive,
                }
            }
            "ls" => Command::List(args.next().map(str::to_string)),
            "cd" => Command::Cd(required(args.next(), "cd <path>")?),
            "touch" => {
                let path = required(args.next(), "touch <path> [content]")?;
                let content = rest[path.len()..].trim_start().to_string();
                Command::Touch { path, content }
            }
            "less" => Command::Less(required(args.next(), "less <path>")?),
            "sizeof" => Command::SizeOf(required(args.next(), "sizeof <path>")?),
            "pwd" => Command::Pwd,
            "stat" => Command::Stat(required(args.next(), "stat <path>")?),
            "df" => Command::Df,
            "save" => Command::Save(required(args.next(), "save <file>")?),
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn required(arg: Option<&str>, usage: &'static str) -> std::result::Result<String, ParseError> {
    arg.map(str::to_string)
        .ok_or(ParseError::MissingArgument(usage))
}

pub struct Shell {
    fs: ClusterFs,
}

impl Shell {
    pub fn new(fs: ClusterFs) -> Self {
        Shell { fs }
    }

    pub fn fs(&self) -> &ClusterFs {
        &self.fs
    }

    pub fn into_fs(self) -> ClusterFs {
        self.fs
    }

    /// Read commands from `input` until end of input or `exit`
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        for line in input.lines() {
            let line = line?;
            if self.execute_line(&line, out)? == Flow::Exit {
                return Ok(());
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        writeln!(out)
    }

    /// Parse and execute one line
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command, out),
            Ok(None) => Ok(Flow::Continue),
            Err(e) => {
                writeln!(out, "{}", e)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<Flow> {
        debug!("Executing {:?}", command);
        if command == Command::Exit {
            return Ok(Flow::Exit);
        }

        // Filesystem errors become messages; only failures of `out` propagate
        let mut buffer = Vec::new();
        if let Err(e) = self.run_command(command, &mut buffer) {
            writeln!(buffer, "{}", e)?;
        }
        out.write_all(&buffer)?;
        Ok(Flow::Continue)
    }

    fn run_command(&mut self, command: Command, out: &mut Vec<u8>) -> Result<()> {
        match command {
            Command::Exit => {}
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Mkdir(path) => {
                self.fs.mkdir(&path)?;
            }
            Command::Remove { path, recursive } => {
                self.fs.remove(&path, recursive)?;
            }
            Command::List(path) => {
                for entry in self.fs.list(path.as_deref().unwrap_or(""))? {
                    writeln!(out, "{}", entry.name)?;
                }
            }
            Command::Cd(path) => self.fs.cd(&path)?,
            Command::Touch { path, content } => {
                self.fs.touch(&path, content.as_bytes())?;
            }
            Command::Less(path) => {
                out.extend_from_slice(&self.fs.read_file(&path)?);
                writeln!(out)?;
            }
            Command::SizeOf(path) => writeln!(out, "{} bytes", self.fs.size_of(&path)?)?,
            Command::Pwd => writeln!(out, "{}", self.fs.pwd())?,
            Command::Stat(path) => write_stat(out, &self.fs.stat(&path)?)?,
            Command::Df => {
                let stats = self.fs.stats();
                writeln!(
                    out,
                    "{} clusters of {} bytes, {} reserved, {} used, {} free",
                    stats.cluster_count,
                    stats.cluster_size,
                    stats.reserved_clusters,
                    stats.used_clusters,
                    stats.free_clusters
                )?;
            }
            Command::Save(file) => {
                let bytes = self.fs.save(&file)?;
                writeln!(out, "Saved {} bytes to {}", bytes, file)?;
            }
        }
        Ok(())
    }
}

fn write_stat<W: Write>(out: &mut W, entry: &Entry) -> io::Result<()> {
    writeln!(out, "name:        {}", entry.name)?;
    writeln!(out, "type:        {}", entry.node_type.as_str())?;
    writeln!(out, "cluster:     {}", entry.index)?;
    writeln!(out, "permissions: {:o}", entry.permissions)?;
    writeln!(out, "size:        {} bytes", entry.size)?;
    writeln!(out, "clusters:    {}", entry.clusters)?;
    if let Some(children) = entry.children {
        writeln!(out, "children:    {}", children)?;
    }
    Ok(())
}
