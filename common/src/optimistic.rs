//! 楽観的更新つきのリスト
//!
//! 追加した要素はサーバーの応答を待たずに一覧へ出し、
//! 保存に失敗したら取り除く。確定時にはサーバー側のIDを紐付ける。

/// ローカルで払い出す一時ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TentativeId(u64);

/// 一覧の1要素
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub item: T,
    /// 未確定の要素は一時IDを持つ
    pub tentative: Option<TentativeId>,
    /// 確定した要素のサーバー側ID（応答に含まれない場合はNone）
    pub server_id: Option<i64>,
}

impl<T> Entry<T> {
    pub fn is_pending(&self) -> bool {
        self.tentative.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct TentativeList<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
}

impl<T> Default for TentativeList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> TentativeList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 確定済みの要素で一覧を置き換える（サーバーから読み込んだとき）
    pub fn replace_confirmed(&mut self, items: impl IntoIterator<Item = (T, Option<i64>)>) {
        self.entries = items
            .into_iter()
            .map(|(item, server_id)| Entry {
                item,
                tentative: None,
                server_id,
            })
            .collect();
    }

    /// 未確定の要素を末尾に追加
    pub fn apply(&mut self, item: T) -> TentativeId {
        let id = TentativeId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            item,
            tentative: Some(id),
            server_id: None,
        });
        id
    }

    /// 保存成功。見つからなければ false
    pub fn confirm(&mut self, id: TentativeId, server_id: Option<i64>) -> bool {
        match self.entries.iter_mut().find(|e| e.tentative == Some(id)) {
            Some(entry) => {
                entry.tentative = None;
                entry.server_id = server_id;
                true
            }
            None => false,
        }
    }

    /// 保存失敗。追加した要素を取り除いて返す
    pub fn revert(&mut self, id: TentativeId) -> Option<T> {
        let index = self.entries.iter().position(|e| e.tentative == Some(id))?;
        Some(self.entries.remove(index).item)
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_pending()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> TentativeList<&'static str> {
        let mut list = TentativeList::new();
        list.replace_confirmed(vec![("north", Some(1)), ("south", Some(2))]);
        list
    }

    #[test]
    fn test_apply_then_confirm() {
        let mut list = loaded();
        let id = list.apply("east");
        assert_eq!(list.len(), 3);
        assert_eq!(list.pending_count(), 1);

        assert!(list.confirm(id, Some(9)));
        assert_eq!(list.pending_count(), 0);
        assert_eq!(list.entries()[2].server_id, Some(9));
        // 二度目の確定は対象なし
        assert!(!list.confirm(id, Some(9)));
    }

    #[test]
    fn test_revert_restores_previous_list() {
        let mut list = loaded();
        let before: Vec<_> = list.entries().to_vec();

        let id = list.apply("east");
        assert_eq!(list.revert(id), Some("east"));
        assert_eq!(list.entries(), before.as_slice());
        assert_eq!(list.revert(id), None);
    }

    #[test]
    fn test_revert_only_touches_its_own_entry() {
        let mut list = TentativeList::new();
        let a = list.apply("a");
        let b = list.apply("b");
        list.revert(a);
        assert_eq!(list.items().copied().collect::<Vec<_>>(), vec!["b"]);
        assert!(list.confirm(b, None));
        assert!(!list.entries()[0].is_pending());
    }
}
