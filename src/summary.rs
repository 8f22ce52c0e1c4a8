use std::collections::HashMap;

use crate::time_entry::TimeEntry;

/// `(project_id, description)`が同じtime entryを1件にまとめる。
///
/// まとめたtime entryの`duration`は元のtime entryの合計となり、`id`は最初に現れたtime entryのものを利用する。
/// 結果の並び順は各組み合わせが最初に現れた順となる。
pub fn summarize(time_entries: &[TimeEntry]) -> Vec<TimeEntry> {
    let mut positions: HashMap<(Option<i64>, &str), usize> = HashMap::new();
    let mut summarized: Vec<TimeEntry> = Vec::new();

    for entry in time_entries {
        let key = (entry.project_id, entry.description.as_str());
        match positions.get(&key) {
            Some(&index) => summarized[index].duration += entry.duration,
            None => {
                positions.insert(key, summarized.len());
                summarized.push(entry.clone());
            }
        }
    }

    summarized
}
