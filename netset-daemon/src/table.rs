/*!
 * Table Parser
 * Turns the column-aligned text emitted by tools like `nmcli device status`
 * into field-name → value records.
 */

/// One data row: field name → trimmed value, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    fields: Vec<(String, String)>,
}

impl ParsedRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Parse column-aligned tabular text: one header line, then data lines.
///
/// Column names are the whitespace-separated header tokens; each name's
/// start offset is located by a first-occurrence search over the *remaining*
/// header after the previous match, so a later name that repeats a substring
/// of an earlier one (SSID after BSSID) still lands on its own column. A
/// data value is the slice from its column's start offset up to the next
/// column's start offset, the last column running to end of line, trimmed.
///
/// Offsets are character offsets: tools pad columns to content width with
/// spaces, and data cells may hold multibyte glyphs (nmcli's BARS column).
///
/// Known limitation, kept deliberately: if a value is narrower than its
/// header label and the next column's content starts before the label's
/// aligned position, characters are attributed to the wrong column. Tool
/// output is assumed well-behaved (values never overflow past the next
/// header's start offset).
///
/// Values are not coerced; SIGNAL/CHAN stay strings for the caller to parse.
pub fn parse_table(text: &str) -> Vec<ParsedRecord> {
    let mut lines = text.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };

    let header_chars: Vec<char> = header.chars().collect();
    let mut columns: Vec<(String, usize)> = Vec::new();
    let mut search_from = 0usize;
    for name in header.split_whitespace() {
        let name_chars: Vec<char> = name.chars().collect();
        if let Some(found) = find_chars(&header_chars[search_from..], &name_chars) {
            let start = search_from + found;
            columns.push((name.to_string(), start));
            search_from = start + name_chars.len();
        }
    }
    if columns.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line_chars: Vec<char> = line.chars().collect();
        let mut fields = Vec::with_capacity(columns.len());
        for (i, (name, start)) in columns.iter().enumerate() {
            let end = columns
                .get(i + 1)
                .map(|(_, next_start)| *next_start)
                .unwrap_or(line_chars.len());
            let from = (*start).min(line_chars.len());
            let to = end.clamp(from, line_chars.len());
            let value: String = line_chars[from..to].iter().collect();
            fields.push((name.clone(), value.trim().to_string()));
        }
        records.push(ParsedRecord { fields });
    }
    records
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_table("").is_empty());
    }

    #[test]
    fn header_only_yields_no_records() {
        assert!(parse_table("DEVICE TYPE STATE CONNECTION\n").is_empty());
    }

    #[test]
    fn device_status_table() {
        let text = "DEVICE         TYPE      STATE                   CONNECTION\n\
                    eth0           ethernet  connected               Wired connection 1\n\
                    wlan0          wifi      disconnected            --\n";
        let records = parse_table(text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("DEVICE"), Some("eth0"));
        assert_eq!(records[0].get("TYPE"), Some("ethernet"));
        assert_eq!(records[0].get("STATE"), Some("connected"));
        assert_eq!(records[0].get("CONNECTION"), Some("Wired connection 1"));
        assert_eq!(records[1].get("DEVICE"), Some("wlan0"));
        assert_eq!(records[1].get("TYPE"), Some("wifi"));
        assert_eq!(records[1].get("STATE"), Some("disconnected"));
        assert_eq!(records[1].get("CONNECTION"), Some("--"));
    }

    #[test]
    fn state_qualifier_stays_in_the_state_column() {
        let text = "DEVICE         TYPE      STATE                   CONNECTION\n\
                    lo             loopback  connected (externally)  lo\n";
        let records = parse_table(text);
        assert_eq!(records[0].get("STATE"), Some("connected (externally)"));
        assert_eq!(records[0].get("CONNECTION"), Some("lo"));
    }

    #[test]
    fn key_count_matches_header_columns() {
        let text = "DEVICE         TYPE      STATE                   CONNECTION\n\
                    p2p-dev-wlan0  wifi-p2p  disconnected            --\n";
        let records = parse_table(text);
        assert_eq!(records[0].len(), 4);
    }

    #[test]
    fn repeated_header_substring_binds_to_its_own_column() {
        // SSID repeats inside BSSID; the shrinking search must place the
        // SSID column at its own offset, not at the match inside BSSID.
        let text = "IN-USE  BSSID              SSID          MODE\n\
                    *       BA:FF:16:AA:F7:94  Android12356  Infra\n";
        let records = parse_table(text);
        assert_eq!(records[0].get("SSID"), Some("Android12356"));
        assert_eq!(records[0].get("BSSID"), Some("BA:FF:16:AA:F7:94"));
        assert_eq!(records[0].get("IN-USE"), Some("*"));
    }

    #[test]
    fn wifi_list_with_multibyte_bars_and_spaced_ssids() {
        let text = "\
IN-USE  BSSID              SSID                MODE   CHAN  RATE        SIGNAL  BARS  SECURITY
*       BA:FF:16:AA:F7:94  Android12356        Infra  6     130 Mbit/s  100     ▂▄▆█  WPA2
        78:FF:20:AA:5B:83  SSID 1 2         3  Infra  6     130 Mbit/s  92      ▂▄▆█  --
        7E:FF:20:AA:5B:83  --                  Infra  6     130 Mbit/s  89      ▂▄▆█  WPA2
";
        let records = parse_table(text);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].get("SSID"), Some("Android12356"));
        assert_eq!(records[0].get("SIGNAL"), Some("100"));
        assert_eq!(records[0].get("BARS"), Some("▂▄▆█"));
        assert_eq!(records[0].get("SECURITY"), Some("WPA2"));
        assert_eq!(records[0].get("RATE"), Some("130 Mbit/s"));
        assert_eq!(records[0].get("CHAN"), Some("6"));

        // Inner runs of spaces inside a cell survive; only the edges trim.
        assert_eq!(records[1].get("SSID"), Some("SSID 1 2         3"));
        assert_eq!(records[1].get("SECURITY"), Some("--"));

        assert_eq!(records[2].get("SSID"), Some("--"));
        assert_eq!(records[2].get("SIGNAL"), Some("89"));
    }

    #[test]
    fn last_column_absorbs_to_end_of_line() {
        let text = "DEVICE  CONNECTION\n\
                    eth0    Wired connection 1 with a very long name\n";
        let records = parse_table(text);
        assert_eq!(
            records[0].get("CONNECTION"),
            Some("Wired connection 1 with a very long name")
        );
    }

    #[test]
    fn short_lines_yield_empty_trailing_values() {
        let text = "DEVICE  TYPE      STATE\n\
                    eth0\n";
        let records = parse_table(text);
        assert_eq!(records[0].get("DEVICE"), Some("eth0"));
        assert_eq!(records[0].get("TYPE"), Some(""));
        assert_eq!(records[0].get("STATE"), Some(""));
        assert_eq!(records[0].len(), 3);
    }

    #[test]
    fn recovers_n_trimmed_values_per_row_in_header_order() {
        let text = "A     BB    CCC\n\
                    1     2     3\n\
                    x     y     z\n";
        for record in parse_table(text) {
            let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
            assert_eq!(names, vec!["A", "BB", "CCC"]);
        }
    }
}
