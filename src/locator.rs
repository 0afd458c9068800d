use crate::splitter::Command;

/// Maps a character offset (e.g. an editor cursor) to the command that contains it.
///
/// The gap between two commands belongs to the earlier one, so a cursor sitting right after a
/// delimiter still resolves to the statement just typed. An offset before the first command
/// resolves to the first command; an offset past the end of the last command resolves to `None`.
///
/// `commands` must be in the order the splitter produced them.
pub fn command_index_at(commands: &[Command], offset: usize) -> Option<usize> {
    let last = commands.last()?;
    if offset > last.end {
        return None;
    }
    let idx = commands.partition_point(|c| c.start <= offset);
    Some(idx.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(index: usize, start: usize, end: usize) -> Command {
        Command {
            index,
            start,
            end,
            text: None,
            delimiter: None,
            leading_whitespace_included: false,
        }
    }

    #[test]
    fn test_offset_inside_a_command() {
        let commands = [command(0, 0, 20), command(1, 22, 45)];
        assert_eq!(command_index_at(&commands, 5), Some(0));
        assert_eq!(command_index_at(&commands, 30), Some(1));
    }

    #[test]
    fn test_gaps_belong_to_the_earlier_command() {
        let commands = [command(0, 0, 20), command(1, 22, 45)];
        // Right after the first command's delimiter.
        assert_eq!(command_index_at(&commands, 20), Some(0));
        assert_eq!(command_index_at(&commands, 21), Some(0));
        assert_eq!(command_index_at(&commands, 22), Some(1));
    }

    #[test]
    fn test_boundaries() {
        let commands = [command(0, 3, 20), command(1, 22, 45)];
        // Leading whitespace before the first command still resolves to it.
        assert_eq!(command_index_at(&commands, 0), Some(0));
        // The end offset is inclusive for lookup purposes, one past it is not.
        assert_eq!(command_index_at(&commands, 45), Some(1));
        assert_eq!(command_index_at(&commands, 46), None);
        assert_eq!(command_index_at(&[], 0), None);
    }
}
