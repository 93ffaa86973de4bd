//! A case-insensitive keyword trie over ASCII bytes.

use rustc_hash::FxHashMap;

pub struct Trie<T> {
    value: Option<T>,
    children: FxHashMap<u8, Trie<T>>,
}

impl<T> Trie<T> {
    pub fn builder() -> TrieBuilder<T> {
        TrieBuilder {
            root: Trie {
                value: None,
                children: FxHashMap::default(),
            },
        }
    }

    /// Looks up `key` ASCII case-insensitively. Only exact-length matches
    /// return a value.
    pub fn get_ignore_case(&self, key: &[u8]) -> Option<&T> {
        let mut node = self;
        for &b in key {
            node = node.children.get(&b.to_ascii_lowercase())?;
        }
        node.value.as_ref()
    }
}

pub struct TrieBuilder<T> {
    root: Trie<T>,
}

impl<T> TrieBuilder<T> {
    pub fn put(mut self, key: &str, value: T) -> Self {
        let mut node = &mut self.root;
        for b in key.bytes() {
            node = node.children.entry(b.to_ascii_lowercase()).or_insert(Trie {
                value: None,
                children: FxHashMap::default(),
            });
        }
        node.value = Some(value);
        self
    }

    pub fn build(self) -> Trie<T> {
        self.root
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exact_case_insensitive_lookup() {
        let t = Trie::builder().put("href", 1).put("hreflang", 2).build();
        assert_eq!(t.get_ignore_case(b"href"), Some(&1));
        assert_eq!(t.get_ignore_case(b"HREF"), Some(&1));
        assert_eq!(t.get_ignore_case(b"hreflang"), Some(&2));
        assert_eq!(t.get_ignore_case(b"hre"), None);
        assert_eq!(t.get_ignore_case(b"hrefs"), None);
    }
}
