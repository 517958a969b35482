//! Line commands typed at the console prompt.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `new <text>` sets the pending text first; bare `new` submits what is pending.
    New(Option<String>),
    Edit(usize),
    /// Leaves edit mode without re-submitting.
    Unedit(usize),
    Set { row: usize, text: String },
    Save(usize),
    Delete(usize),
    List,
    Export,
    Ping,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  new [text]        submit text (or the pending text) for prediction
  edit <row>        start editing a row
  unedit <row>      stop editing a row without saving
  set <row> [text]  replace a row's text (empty text deletes on save)
  save <row>        re-submit an edited row
  delete <row>      remove a row locally
  list              show all rows
  export            print rows as JSON
  ping              check the prediction service
  quit              wait for outstanding requests and exit";

/// Rows are 1-based at the prompt and 0-based everywhere else.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "new" | "add" => Ok(ConsoleCommand::New(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "edit" => parse_row(rest).map(ConsoleCommand::Edit),
        "unedit" | "cancel" => parse_row(rest).map(ConsoleCommand::Unedit),
        "set" => {
            let (row, text) = match rest.split_once(char::is_whitespace) {
                Some((row, text)) => (row, text.trim()),
                None => (rest, ""),
            };
            Ok(ConsoleCommand::Set {
                row: parse_row(row)?,
                text: text.to_string(),
            })
        }
        "save" | "update" => parse_row(rest).map(ConsoleCommand::Save),
        "delete" | "rm" => parse_row(rest).map(ConsoleCommand::Delete),
        "list" | "ls" => Ok(ConsoleCommand::List),
        "export" => Ok(ConsoleCommand::Export),
        "ping" => Ok(ConsoleCommand::Ping),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        "" => Err("empty command".to_string()),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

fn parse_row(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(row) if row > 0 => Ok(row - 1),
        _ => Err(format!("expected a row number, got '{raw}'")),
    }
}
