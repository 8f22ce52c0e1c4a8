/// Togglに記録された1件のtime entry。
///
/// `project_id`はプロジェクト未割り当ての場合`None`となる。
/// `duration`が負の値の場合は計測中のtime entryを表す。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: i64,
    pub project_id: Option<i64>,
    pub description: String,
    pub duration: i64,
}

/// Togglのプロジェクト。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

/// 認証済みユーザーの情報。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Me {
    pub full_name: String,
    pub email: String,
}
