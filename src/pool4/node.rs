//! One IPv4 address registered in a protocol's pool, and its four port
//! sections.

use std::net::Ipv4Addr;

use super::section::{Section, SectionKind};

#[derive(Debug, Clone)]
pub struct PoolNode {
    pub addr: Ipv4Addr,
    sections: [Section; 4],
}

impl PoolNode {
    #[must_use]
    pub fn new(addr: Ipv4Addr) -> Self {
        Self {
            addr,
            sections: SectionKind::ALL.map(Section::new),
        }
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        &mut self.sections[SectionKind::ALL.iter().position(|k| *k == kind).unwrap()]
    }

    #[must_use]
    pub fn has_capacity(&self, kind: SectionKind) -> bool {
        self.sections[SectionKind::ALL.iter().position(|k| *k == kind).unwrap()].has_capacity()
    }
}
