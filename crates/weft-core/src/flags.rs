//! Effect flags recorded during reconciliation and consumed at commit.

use bitflags::bitflags;

bitflags! {
    /// Side effects a fiber requires at commit time. `subtree_flags` holds
    /// the OR of all descendant flags so whole subtrees can be skipped.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct FiberFlags: u32 {
        const PLACEMENT = 1 << 1;
        const UPDATE = 1 << 2;
        const CHILD_DELETION = 1 << 4;
        const PASSIVE = 1 << 11;
    }
}

impl FiberFlags {
    /// Work applied by the mutation pass.
    pub const MUTATION_MASK: FiberFlags = FiberFlags::PLACEMENT
        .union(FiberFlags::UPDATE)
        .union(FiberFlags::CHILD_DELETION);

    /// Work applied by the layout pass. Layout effects ride the Update bit.
    pub const LAYOUT_MASK: FiberFlags = FiberFlags::UPDATE;

    pub fn has_mutation_work(self) -> bool {
        self.intersects(Self::MUTATION_MASK)
    }

    pub fn has_layout_work(self) -> bool {
        self.intersects(Self::LAYOUT_MASK)
    }

    pub fn has_passive_work(self) -> bool {
        self.intersects(Self::PASSIVE)
    }
}

bitflags! {
    /// Phase and dirtiness bits on a hook effect record.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct HookFlags: u8 {
        /// Set when the effect must (re)run this commit.
        const HAS_EFFECT = 1 << 0;
        /// Runs synchronously after mutations, before paint.
        const LAYOUT = 1 << 1;
        /// Deferred effect; runs in the passive pass.
        const PASSIVE = 1 << 2;
    }
}
