/// Prompt commands and autocomplete logic

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Recent,
  Help,
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub kind: CommandKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    kind: CommandKind::Recent,
    name: "recent",
    aliases: &["r", "history"],
    description: "List the most recently cached books",
  },
  Command {
    kind: CommandKind::Help,
    name: "help",
    aliases: &["h", "?"],
    description: "Show available commands",
  },
  Command {
    kind: CommandKind::Quit,
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit bookshelf",
  },
];

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
  /// Anything not starting with `:` is a search query, passed through raw
  Search(&'a str),
  Command(CommandKind),
  Unknown(&'a str),
}

/// Classify a prompt line. `:name` resolves to the best autocomplete match.
pub fn parse_input(line: &str) -> Input<'_> {
  let Some(command) = line.trim_start().strip_prefix(':') else {
    return Input::Search(line);
  };

  let command = command.trim();
  if command.is_empty() {
    return Input::Unknown(command);
  }

  match get_suggestions(command).first() {
    Some(cmd) => Input::Command(cmd.kind),
    None => Input::Unknown(command),
  }
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("recent");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "recent");
  }

  #[test]
  fn test_alias_match() {
    let suggestions = get_suggestions("q");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "quit");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("rec");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "recent");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("cen");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "recent");
  }

  #[test]
  fn test_parse_search_keeps_raw_text() {
    assert_eq!(parse_input("  Jazz   History "), Input::Search("  Jazz   History "));
  }

  #[test]
  fn test_parse_commands() {
    assert_eq!(parse_input(":recent"), Input::Command(CommandKind::Recent));
    assert_eq!(parse_input(" :q"), Input::Command(CommandKind::Quit));
    assert_eq!(parse_input(":HELP"), Input::Command(CommandKind::Help));
    assert_eq!(parse_input(":xyz"), Input::Unknown("xyz"));
    assert_eq!(parse_input(":"), Input::Unknown(""));
  }
}
