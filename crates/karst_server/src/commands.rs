pub const DEFAULT_REGEN_RADIUS: i32 = 4;
const MAX_REGEN_RADIUS: i32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Noop,
    Stop,
    Help,
    Seed,
    Stats,
    /// Clear and regenerate the square of columns around the world origin.
    Regen(i32),
    InvalidUsage(String),
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Noop;
    }

    let input = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if input.is_empty() {
        return Command::Noop;
    }

    let mut head_tail = input.splitn(2, char::is_whitespace);
    let command = head_tail.next().unwrap_or_default().to_ascii_lowercase();
    let rest = head_tail.next().unwrap_or("").trim();

    match command.as_str() {
        "stop" => Command::Stop,
        "help" => Command::Help,
        "seed" => Command::Seed,
        "stats" => Command::Stats,
        "regen" => {
            if rest.is_empty() {
                return Command::Regen(DEFAULT_REGEN_RADIUS);
            }
            match rest.parse::<i32>() {
                Ok(radius) if (1..=MAX_REGEN_RADIUS).contains(&radius) => Command::Regen(radius),
                _ => Command::InvalidUsage(format!(
                    "Usage: /regen [radius], where radius is between 1 and {MAX_REGEN_RADIUS}"
                )),
            }
        }
        _ => Command::Unknown(input.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command, DEFAULT_REGEN_RADIUS};

    #[test]
    fn parses_required_commands() {
        assert_eq!(parse_command("/stop"), Command::Stop);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(parse_command("/seed"), Command::Seed);
        assert_eq!(parse_command("STATS"), Command::Stats);
        assert_eq!(parse_command("/regen 8"), Command::Regen(8));
    }

    #[test]
    fn regen_defaults_and_reports_usage_errors() {
        assert_eq!(parse_command("/regen"), Command::Regen(DEFAULT_REGEN_RADIUS));
        assert!(matches!(
            parse_command("/regen 0"),
            Command::InvalidUsage(_)
        ));
        assert!(matches!(
            parse_command("/regen 99"),
            Command::InvalidUsage(_)
        ));
        assert!(matches!(
            parse_command("/regen lots"),
            Command::InvalidUsage(_)
        ));
    }

    #[test]
    fn blank_lines_and_unknown_commands_are_distinguished() {
        assert_eq!(parse_command("   "), Command::Noop);
        assert_eq!(parse_command("/"), Command::Noop);
        assert_eq!(
            parse_command("/teleport 1 2 3"),
            Command::Unknown("teleport 1 2 3".to_string())
        );
    }
}
