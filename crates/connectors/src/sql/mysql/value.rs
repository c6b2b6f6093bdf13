use mysql_async::Value as MySqlValue;

/// Renders a MySQL value the way the text protocol would send it.
///
/// `NULL` becomes the empty string; non-UTF-8 bytes are replaced lossily.
pub fn to_text(value: &MySqlValue) -> String {
    match value {
        MySqlValue::NULL => String::new(),
        MySqlValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        MySqlValue::Int(i) => i.to_string(),
        MySqlValue::UInt(u) => u.to_string(),
        MySqlValue::Float(f) => f.to_string(),
        MySqlValue::Double(d) => d.to_string(),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let mut text = format!("{year:04}-{month:02}-{day:02}");
            if (*hour, *minute, *second, *micros) != (0, 0, 0, 0) {
                text.push_str(&format!(" {hour:02}:{minute:02}:{second:02}"));
                if *micros > 0 {
                    text.push_str(&format!(".{micros:06}"));
                }
            }
            text
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, micros) => {
            let total_hours = *days * 24 + u32::from(*hours);
            let sign = if *negative { "-" } else { "" };
            let mut text = format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                text.push_str(&format!(".{micros:06}"));
            }
            text
        }
    }
}
