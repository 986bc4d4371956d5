//! 名单记录
//!
//! 一条记录就是 CSV 中的一行（带引号的字段可以跨物理行），字段顺序固定（姓名、单位……），
//! 按全部字段判断是否相同

use csv::StringRecord;
use std::fmt;

/// 一条记录至少包含的字段数（姓名 + 单位）
pub const MIN_FIELDS: usize = 2;

/// 文件名中会被替换的路径分隔符
const PATH_SEPARATORS: [char; 3] = ['/', '\\', '\0'];

/// 名单记录
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record(Vec<String>);

impl Record {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// 由一行 CSV 构造记录
    ///
    /// # 返回
    /// 字段数不足时返回错误原因
    pub fn from_row(row: &StringRecord) -> Result<Self, String> {
        if row.len() < MIN_FIELDS {
            return Err(format!(
                "至少需要 {} 个字段，实际 {} 个: {:?}",
                MIN_FIELDS,
                row.len(),
                row.iter().collect::<Vec<_>>()
            ));
        }
        Ok(Self(row.iter().map(str::to_string).collect()))
    }

    /// 输出文件的基础名：字段以逗号连接，路径分隔符替换为下划线
    pub fn base_name(&self) -> String {
        self.0
            .join(",")
            .chars()
            .map(|c| if PATH_SEPARATORS.contains(&c) { '_' } else { c })
            .collect()
    }
}

/// 序列化为一行 CSV（不含换行），只在必要时加引号
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(&self.0).map_err(|_| fmt::Error)?;
        let bytes = writer.into_inner().map_err(|_| fmt::Error)?;
        let line = std::str::from_utf8(&bytes).map_err(|_| fmt::Error)?;
        f.write_str(line.strip_suffix('\n').unwrap_or(line))
    }
}

/// 无表头、字段数可变的 CSV 读取器，名单和处理记录共用
pub fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// 行号（从 1 开始），取自读取器记录的位置
pub fn row_line(row: &StringRecord) -> usize {
    row.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// 只含空白的行视为空行
pub fn is_blank_row(row: &StringRecord) -> bool {
    row.len() <= 1 && row.iter().all(|field| field.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(text: &str) -> Vec<StringRecord> {
        csv_reader(text).records().map(Result::unwrap).collect()
    }

    #[test]
    fn plain_row_becomes_record() {
        let record = Record::from_row(&rows("Alice,Acme\n")[0]).unwrap();
        assert_eq!(record.fields(), &["Alice", "Acme"]);
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_line_breaks() {
        let text = "\"Smith, John\",\"The \"\"Best\"\" Co\"\n\"Alice\nSmith\",Acme\r\n";
        let parsed = rows(text);
        assert_eq!(parsed.len(), 2);

        let first = Record::from_row(&parsed[0]).unwrap();
        assert_eq!(first.fields(), &["Smith, John", r#"The "Best" Co"#]);
        let second = Record::from_row(&parsed[1]).unwrap();
        assert_eq!(second.fields(), &["Alice\nSmith", "Acme"]);
        assert_eq!(row_line(&parsed[1]), 2);

        for record in [first, second] {
            let again = rows(&format!("{record}\n"));
            assert_eq!(Record::from_row(&again[0]).unwrap(), record);
        }
    }

    #[test]
    fn single_field_is_rejected() {
        assert!(Record::from_row(&rows("Alice\n")[0]).is_err());
        assert!(Record::from_row(&rows("\"Alice, Acme\"\n")[0]).is_err());
    }

    #[test]
    fn empty_trailing_field_is_kept() {
        let record = Record::from_row(&rows("Alice,\n")[0]).unwrap();
        assert_eq!(record.fields(), &["Alice", ""]);
    }

    #[test]
    fn plain_fields_are_written_unquoted() {
        assert_eq!(Record::new(["Alice", "Acme"]).to_string(), "Alice,Acme");
        assert_eq!(Record::new(["A\nB", "C"]).to_string(), "\"A\nB\",C");
    }

    #[test]
    fn whitespace_only_row_is_blank() {
        assert!(is_blank_row(&rows("   \n")[0]));
        assert!(!is_blank_row(&rows(" ,\n")[0]));
    }

    #[test]
    fn base_name_replaces_path_separators() {
        let record = Record::new(["A/B", "C\\D"]);
        assert_eq!(record.base_name(), "A_B,C_D");
        assert!(!record.base_name().contains('/'));
    }
}
