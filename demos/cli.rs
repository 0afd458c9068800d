use sqlsplit::{split_file, Dialect, Encoding, Options};
use terminal_size::{terminal_size, Width};

const ELLIPSIS: &str = "...";
const METADATA_COL_WIDTH: usize = 27;

fn main() {
    let filename =
        std::env::args().nth(1).expect(r#"Usage: cargo run --example cli FILENAME.sql [DIALECT]"#);
    let dialect = std::env::args()
        .nth(2)
        .map(|name| Dialect::parse(&name).expect("unknown dialect"))
        .unwrap_or_default();
    let col_width: usize =
        terminal_size().map(|(Width(w), _)| w as usize).unwrap_or(80) - METADATA_COL_WIDTH;

    let splitter = split_file(&filename, Encoding::Utf8, Options::for_dialect(dialect))
        .expect("Failed to open file");

    println!("------------+------------+-{}", "-".repeat(col_width));
    println!("    START   |     END    | COMMAND");
    println!("------------+------------+-{}", "-".repeat(col_width));
    for command in splitter {
        let command = command.expect("Failed to split file");
        let sql = fit(&command.text.unwrap_or_default(), col_width);
        let delimiter = command
            .delimiter
            .map(|d| d.to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!(" {:>10} | {:>10} | {}", command.start, command.end, sql);
        println!(" {:>10} | {:>10} |   delimiter: {}", "", "", delimiter);
    }
}

// Flattens the command to one line and shortens it to the column width. Counts and cuts in
// characters, not bytes, so multi-byte text never splits mid-character.
fn fit(sql: &str, col_width: usize) -> String {
    let flat = sql.replace('\n', " ");
    if flat.chars().count() <= col_width {
        return flat;
    }
    let mut out: String =
        flat.chars().take(col_width.saturating_sub(ELLIPSIS.len())).collect();
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::fit;

    #[test]
    fn test_fit_cuts_on_character_boundaries() {
        assert_eq!(fit("SELECT 1", 20), "SELECT 1");
        assert_eq!(fit("SELECT 1\nFROM t", 20), "SELECT 1 FROM t");
        // Accented characters count as one column each and never split.
        assert_eq!(fit("SELECT 'déjà vu déjà vu'", 10), "SELECT ...");
        assert_eq!(fit("éééééééééé", 6), "ééé...");
    }
}
