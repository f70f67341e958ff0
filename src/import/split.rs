pub fn split_raw_rows(raw_text: &str) -> Vec<String> {
    raw_text
        .split(['\n', '\r', '\t', ';'])
        .map(str::trim)
        .filter(|row| !row.is_empty())
        .flat_map(split_comma_row)
        .collect()
}

fn split_comma_row(row: &str) -> Vec<String> {
    if !row.contains(',') {
        return vec![row.to_string()];
    }

    let parts = row
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<&str>>();
    if parts.is_empty() {
        return vec![row.to_string()];
    }

    if parts.len() == 2 {
        if parts.iter().all(|part| looks_like_full_name(part)) {
            return parts.into_iter().map(ToOwned::to_owned).collect();
        }
        return vec![row.to_string()];
    }

    let alternating_last_first =
        parts.len() % 2 == 0 && parts.iter().all(|part| word_count(part) == 1);
    if alternating_last_first {
        return parts
            .chunks_exact(2)
            .map(|pair| format!("{}, {}", pair[0], pair[1]))
            .collect();
    }

    if parts.iter().all(|part| looks_like_full_name(part)) {
        return parts.into_iter().map(ToOwned::to_owned).collect();
    }

    vec![row.to_string()]
}

fn word_count(part: &str) -> usize {
    part.split_whitespace().count()
}

fn looks_like_full_name(part: &str) -> bool {
    word_count(part) >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_become_rows() {
        let rows = split_raw_rows("Amy Chen\tJames Jackson;;Maria Lopez\r\n\nSam Hill");
        assert_eq!(rows, vec!["Amy Chen", "James Jackson", "Maria Lopez", "Sam Hill"]);
    }

    #[test]
    fn two_full_names_split_on_comma() {
        let rows = split_raw_rows("Jane Doe, John Smith");
        assert_eq!(rows, vec!["Jane Doe", "John Smith"]);
    }

    #[test]
    fn single_last_first_pair_stays_whole() {
        assert_eq!(split_raw_rows("Lopez, Maria"), vec!["Lopez, Maria"]);
    }

    #[test]
    fn alternating_tokens_pair_as_last_first() {
        let rows = split_raw_rows("Doe, Jane, Smith, John");
        assert_eq!(rows, vec!["Doe, Jane", "Smith, John"]);
    }

    #[test]
    fn many_full_names_split_individually() {
        let rows = split_raw_rows("Jane Doe, John Smith, Amy Chen");
        assert_eq!(rows, vec!["Jane Doe", "John Smith", "Amy Chen"]);
    }

    #[test]
    fn trailing_qualifier_is_not_split_off() {
        assert_eq!(split_raw_rows("Jackson, James, RN"), vec!["Jackson, James, RN"]);
    }

    #[test]
    fn bare_comma_row_is_kept_for_review() {
        assert_eq!(split_raw_rows(" , "), vec![","]);
    }
}
