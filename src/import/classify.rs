use crate::model::ImportSourceType;

pub fn non_blank_lines(raw_text: &str) -> impl Iterator<Item = &str> {
    raw_text
        .split(['\n', '\r'])
        .filter(|line| !line.trim().is_empty())
}

pub fn detect_source_type(raw_text: &str) -> ImportSourceType {
    let mut line_count = 0usize;
    let mut tabular_count = 0usize;

    for line in non_blank_lines(raw_text) {
        line_count += 1;
        if is_tabular_line(line) {
            tabular_count += 1;
        }
    }

    if line_count == 0 {
        return ImportSourceType::ListText;
    }

    if tabular_count * 2 > line_count {
        ImportSourceType::TableTsv
    } else {
        ImportSourceType::ListText
    }
}

fn is_tabular_line(line: &str) -> bool {
    line.contains('\t')
        && line
            .split('\t')
            .filter(|cell| !cell.trim().is_empty())
            .count()
            >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_paste_defaults_to_list() {
        assert_eq!(detect_source_type(""), ImportSourceType::ListText);
        assert_eq!(detect_source_type(" \n\r\n\t"), ImportSourceType::ListText);
    }

    #[test]
    fn majority_of_tabbed_lines_is_a_table() {
        let raw = "James\tJackson\nLopez, Maria\nAmy\tChen";
        assert_eq!(detect_source_type(raw), ImportSourceType::TableTsv);
    }

    #[test]
    fn exactly_half_tabbed_lines_stays_list() {
        let raw = "Kathy Johnson\tKathy Johnson\nLopez, Maria";
        assert_eq!(detect_source_type(raw), ImportSourceType::ListText);
    }

    #[test]
    fn tabs_with_one_filled_cell_do_not_count() {
        let raw = "James Jackson\t\nAmy Chen\t \n";
        assert_eq!(detect_source_type(raw), ImportSourceType::ListText);
    }
}
