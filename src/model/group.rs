use super::uid::Uid;

/// An address-book group, rebuilt from one or more group marker records of the same name.
/// Lives only while groups are being dissolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDefinition {
    pub name: String,
    pub member_uids: Vec<Uid>,
}

impl GroupDefinition {
    pub fn create(name: String, member_uids: Vec<Uid>) -> Self {
        Self { name, member_uids }
    }

    /// Union in members from another marker record carrying the same group name.
    pub fn absorb(&mut self, members: Vec<Uid>) {
        self.member_uids.extend(members);
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.member_uids.iter().any(|m| m == uid)
    }
}
