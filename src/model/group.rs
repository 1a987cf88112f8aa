use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Category,
    Relationship,
}

impl GroupKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Relationship => "relationship",
        }
    }
}

/// A named bucket of nodes (category) or edges (relationship type).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub index: usize,
    pub show: bool,
}

/// Insertion-ordered groups with a name index.
///
/// Indices come from a counter that only moves forward, so a retracted name
/// that comes back later gets a fresh index and surviving groups keep theirs.
#[derive(Clone, Debug, Default)]
pub struct GroupSet {
    groups: Vec<Group>,
    position_by_name: HashMap<String, usize>,
    next_index: usize,
}

impl GroupSet {
    pub fn get(&self, name: &str) -> Option<&Group> {
        self.position_by_name
            .get(name)
            .map(|&position| &self.groups[position])
    }

    /// Returns the group for `name`, creating it with the next index if needed.
    pub fn resolve(&mut self, name: &str) -> &Group {
        if let Some(&position) = self.position_by_name.get(name) {
            return &self.groups[position];
        }

        let position = self.groups.len();
        self.groups.push(Group {
            name: name.to_owned(),
            index: self.next_index,
            show: true,
        });
        self.next_index += 1;
        self.position_by_name.insert(name.to_owned(), position);
        &self.groups[position]
    }

    pub fn remove(&mut self, name: &str) -> Option<Group> {
        let position = self.position_by_name.remove(name)?;
        let group = self.groups.remove(position);
        for later in position..self.groups.len() {
            self.position_by_name
                .insert(self.groups[later].name.clone(), later);
        }
        Some(group)
    }

    pub fn set_show(&mut self, name: &str, show: bool) -> bool {
        let Some(&position) = self.position_by_name.get(name) else {
            return false;
        };
        self.groups[position].show = show;
        true
    }

    pub fn is_shown(&self, name: &str) -> bool {
        self.get(name).is_none_or(|group| group.show)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
