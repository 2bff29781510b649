//! # Memory to Register Promotion Pass
//!
//! This pass implements the classic mem2reg optimization using SSA
//! construction. It promotes stack cells accessed only through whole-cell
//! loads and stores to SSA virtual registers by:
//! 1. Identifying promotable cells (no address taken, type-exact accesses)
//! 2. Inserting phi nodes on the iterated dominance frontier of the stores
//! 3. Renaming accesses along a CFG walk that threads the live value through
//!
//! Two fast paths short-circuit the full algorithm and may decline into it:
//! a cell written by a single store, and a cell whose every access sits in
//! one block. Loads with no reaching store become `undef`; accesses left in
//! unreachable code become `poison` during cleanup.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};

use crate::analysis::dominance::{
    compute_dominance_frontiers, compute_dominator_tree, compute_iterated_dominance_frontier,
    DominanceFrontiers, DominatorTree,
};
use crate::cfg::{distinct_successors, edge_count, predecessor_map};
use crate::passes::MirPass;
use crate::{
    BasicBlockId, Instruction, InstructionKind, MirFunction, MirType, Value, ValueId,
};

/// Memory to register promotion pass
///
/// The driver repeatedly scans the entry block for promotable cells and
/// promotes them until none remain. Cells outside the entry block are legal
/// input to [`promote_mem_to_reg`] but are not collected by the driver,
/// matching the convention that locals are allocated on function entry.
pub struct Mem2Reg {
    /// Statistics for optimization reporting
    stats: PromotionStats,
}

/// Counters describing one or more promotion runs
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PromotionStats {
    pub cells_analyzed: usize,
    pub cells_promoted: usize,
    pub single_store_rewrites: usize,
    pub single_block_rewrites: usize,
    pub phis_inserted: usize,
    pub loads_eliminated: usize,
    pub stores_eliminated: usize,
}

impl PromotionStats {
    fn absorb(&mut self, other: &Self) {
        self.cells_analyzed += other.cells_analyzed;
        self.cells_promoted += other.cells_promoted;
        self.single_store_rewrites += other.single_store_rewrites;
        self.single_block_rewrites += other.single_block_rewrites;
        self.phis_inserted += other.phis_inserted;
        self.loads_eliminated += other.loads_eliminated;
        self.stores_eliminated += other.stores_eliminated;
    }
}

impl Default for Mem2Reg {
    fn default() -> Self {
        Self::new()
    }
}

impl Mem2Reg {
    /// Create a new promotion pass
    pub fn new() -> Self {
        Self {
            stats: PromotionStats::default(),
        }
    }

    /// Counters accumulated over every function this pass instance has run on
    pub const fn stats(&self) -> &PromotionStats {
        &self.stats
    }
}

impl MirPass for Mem2Reg {
    fn run(&mut self, function: &mut MirFunction) -> bool {
        // The pass preserves the CFG, so one dominator tree serves every
        // round of the scan loop.
        let dom_tree = compute_dominator_tree(function);
        let mut function_stats = PromotionStats::default();
        let mut changed = false;

        loop {
            let mut cells = Vec::new();
            for instruction in &function.basic_blocks[function.entry_block].instructions {
                if let InstructionKind::StackAlloc { dest, ty } = &instruction.kind {
                    if is_promotable(function, *dest, ty) {
                        cells.push(*dest);
                    }
                }
            }
            if cells.is_empty() {
                break;
            }

            let stats = promote_mem_to_reg(&cells, &dom_tree, function);
            function_stats.absorb(&stats);
            changed = true;
        }

        if changed {
            log::debug!(
                "mem2reg promoted {} cell(s) in '{}': {} phi(s) inserted, {} load(s) and {} store(s) eliminated",
                function_stats.cells_promoted,
                function.name,
                function_stats.phis_inserted,
                function_stats.loads_eliminated,
                function_stats.stores_eliminated,
            );
        }
        self.stats.absorb(&function_stats);
        changed
    }

    fn name(&self) -> &'static str {
        "Mem2Reg"
    }
}

/// Decides whether a stack cell is safe to promote
///
/// A cell qualifies when every user is either a load of the full allocated
/// type, or a store of the full allocated type whose *pointer* operand is the
/// cell. A store of the cell itself, a typed-differently access, an
/// address-of, a GEP, a call argument, or a terminator operand all
/// disqualify it.
pub fn is_promotable(function: &MirFunction, cell: ValueId, allocated_ty: &MirType) -> bool {
    for (_, block) in function.basic_blocks() {
        for instruction in block.instructions() {
            match &instruction.kind {
                InstructionKind::Load { ty, address, .. } => {
                    if *address == Value::Operand(cell) && ty != allocated_ty {
                        return false;
                    }
                }
                InstructionKind::Store { address, value, ty } => {
                    if *value == Value::Operand(cell) {
                        // the cell's address escapes as a stored value
                        return false;
                    }
                    if *address == Value::Operand(cell) && ty != allocated_ty {
                        return false;
                    }
                }
                _ => {
                    if instruction.used_values().contains(&cell) {
                        return false;
                    }
                }
            }
        }
        if block.terminator().used_values().contains(&cell) {
            return false;
        }
    }
    true
}

/// Promote a pre-filtered list of stack cells of one function, in place
///
/// Behavior is defined only when every cell passes [`is_promotable`]; this is
/// debug-asserted. Afterwards no load or store of any listed cell remains and
/// the cells themselves are gone from the function.
pub fn promote_mem_to_reg(
    cells: &[ValueId],
    dom_tree: &DominatorTree,
    function: &mut MirFunction,
) -> PromotionStats {
    if cells.is_empty() {
        return PromotionStats::default();
    }

    let cell_types: Vec<MirType> = cells
        .iter()
        .map(|&cell| allocated_type(function, cell))
        .collect();
    debug_assert!(
        cells
            .iter()
            .zip(&cell_types)
            .all(|(&cell, ty)| is_promotable(function, cell, ty)),
        "promote_mem_to_reg called with a non-promotable cell"
    );

    let frontiers = compute_dominance_frontiers(function, dom_tree);
    let preds = predecessor_map(function);
    let cell_lookup: FxHashMap<ValueId, usize> = cells
        .iter()
        .enumerate()
        .map(|(index, &cell)| (cell, index))
        .collect();

    Promoter {
        func: function,
        dt: dom_tree,
        frontiers,
        preds,
        cells: cells.to_vec(),
        cell_types,
        cell_lookup,
        phi_registry: BTreeMap::new(),
        phi_to_cell: FxHashMap::default(),
        visited: FxHashSet::default(),
        stats: PromotionStats::default(),
    }
    .run()
}

/// Looks up the allocated type of a cell; the cell must be a stack allocation
fn allocated_type(function: &MirFunction, cell: ValueId) -> MirType {
    function
        .basic_blocks
        .iter()
        .flat_map(|block| &block.instructions)
        .find_map(|instruction| match &instruction.kind {
            InstructionKind::StackAlloc { dest, ty } if *dest == cell => Some(ty.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("value %{} is not a stack allocation", cell.index()))
}

/// Per-cell use/def summary, built by one walk over the function
#[derive(Debug)]
struct CellUsage {
    /// Blocks containing a store to the cell, one entry per store
    defining_blocks: Vec<BasicBlockId>,
    /// Blocks containing a load of the cell, one entry per load
    using_blocks: Vec<BasicBlockId>,
    /// Load sites in block-then-position order
    loads: Vec<(BasicBlockId, usize)>,
    /// Store sites in block-then-position order
    stores: Vec<(BasicBlockId, usize)>,
    /// The last store seen; the unique store when there is exactly one
    only_store: Option<(BasicBlockId, usize)>,
    /// The single block holding every access, while that is still true
    only_block: Option<BasicBlockId>,
    /// True while all loads and stores live in one block
    only_used_in_one_block: bool,
}

impl CellUsage {
    fn note_user_block(&mut self, block: BasicBlockId) {
        match self.only_block {
            None => self.only_block = Some(block),
            Some(existing) if existing != block => self.only_used_in_one_block = false,
            Some(_) => {}
        }
    }
}

/// Values of all promoted cells on entry to a block during renaming
type IncomingValues = SmallVec<[Value; 8]>;

/// A pending visit of the renaming walk: rewrite `block`, having arrived
/// over the edge(s) from `pred` with the given cell values
struct RenameRecord {
    block: BasicBlockId,
    pred: Option<BasicBlockId>,
    values: IncomingValues,
}

/// Shared state of one promotion run over a function
struct Promoter<'f> {
    func: &'f mut MirFunction,
    dt: &'f DominatorTree,
    frontiers: DominanceFrontiers,
    /// Predecessor multiset per block, one entry per incoming edge
    preds: FxHashMap<BasicBlockId, Vec<BasicBlockId>>,
    cells: Vec<ValueId>,
    cell_types: Vec<MirType>,
    cell_lookup: FxHashMap<ValueId, usize>,
    /// Inserted phis keyed by (block number, cell index); ordered so the
    /// cleanup passes iterate deterministically
    phi_registry: BTreeMap<(usize, usize), ValueId>,
    /// Reverse map recording which cell each inserted phi rewrites
    phi_to_cell: FxHashMap<ValueId, usize>,
    visited: FxHashSet<BasicBlockId>,
    stats: PromotionStats,
}

impl Promoter<'_> {
    fn run(mut self) -> PromotionStats {
        let mut remaining: Vec<usize> = Vec::new();

        for cell_index in 0..self.cells.len() {
            self.stats.cells_analyzed += 1;
            let mut info = self.analyze_cell(self.cells[cell_index]);

            if info.loads.is_empty() && info.stores.is_empty() {
                // never accessed; the cell is dead
                self.erase_cell_alloc(cell_index);
                self.stats.cells_promoted += 1;
                continue;
            }

            if info.defining_blocks.len() == 1 && self.rewrite_single_store(cell_index, &mut info)
            {
                self.stats.single_store_rewrites += 1;
                self.stats.cells_promoted += 1;
                continue;
            }

            if info.only_used_in_one_block && self.rewrite_single_block(cell_index, &info) {
                self.stats.single_block_rewrites += 1;
                self.stats.cells_promoted += 1;
                continue;
            }

            self.place_phis(cell_index, &info);
            remaining.push(cell_index);
            self.stats.cells_promoted += 1;
        }

        if remaining.is_empty() {
            self.sweep_nops();
            return self.stats;
        }

        self.rename_walk();
        self.erase_cells(&remaining);
        self.sweep_nops();
        self.simplify_trivial_phis();
        self.fill_missing_phi_operands();

        self.stats
    }

    /// Summarize every load and store of the cell, in block order
    fn analyze_cell(&self, cell: ValueId) -> CellUsage {
        let mut info = CellUsage {
            defining_blocks: Vec::new(),
            using_blocks: Vec::new(),
            loads: Vec::new(),
            stores: Vec::new(),
            only_store: None,
            only_block: None,
            only_used_in_one_block: true,
        };

        for (block_id, block) in self.func.basic_blocks() {
            for (index, instruction) in block.instructions.iter().enumerate() {
                match &instruction.kind {
                    InstructionKind::Store { address, .. }
                        if *address == Value::Operand(cell) =>
                    {
                        info.defining_blocks.push(block_id);
                        info.stores.push((block_id, index));
                        info.only_store = Some((block_id, index));
                        info.note_user_block(block_id);
                    }
                    InstructionKind::Load { address, .. }
                        if *address == Value::Operand(cell) =>
                    {
                        info.using_blocks.push(block_id);
                        info.loads.push((block_id, index));
                        info.note_user_block(block_id);
                    }
                    _ => {}
                }
            }
        }

        info
    }

    /// Fast path: the cell has exactly one store
    ///
    /// Every load the store reaches is replaced with the stored value
    /// directly. Loads the store does not reach stay behind: the residual
    /// using blocks are recorded in `info` and the cell falls through to the
    /// general path (partial success).
    fn rewrite_single_store(&mut self, cell_index: usize, info: &mut CellUsage) -> bool {
        let Some((store_block, store_index)) = info.only_store else {
            return false;
        };
        let stored_value = self.store_value((store_block, store_index));
        // A value not produced by an instruction (constant, marker,
        // parameter) is available in every block, so the cross-block
        // dominance test can be skipped for it.
        let stored_from_instruction =
            matches!(stored_value, Value::Operand(id) if !self.func.is_parameter(id));

        info.using_blocks.clear();
        let loads = std::mem::take(&mut info.loads);
        let mut residual: Vec<(BasicBlockId, usize)> = Vec::new();

        for &(load_block, load_index) in &loads {
            let reached = if load_block == store_block {
                // Within the store's own block only later loads see it; an
                // earlier load reads whatever was in the cell before.
                store_index < load_index
            } else {
                !stored_from_instruction || self.dt.dominates(store_block, load_block)
            };
            if !reached {
                info.using_blocks.push(load_block);
                residual.push((load_block, load_index));
                continue;
            }

            let dest = self.load_dest((load_block, load_index));
            let replacement = if stored_value == Value::Operand(dest) {
                // the store writes the load's own result back; such a cycle
                // only exists in unreachable code
                Value::Poison
            } else {
                stored_value
            };
            self.func.replace_all_uses(dest, replacement);
            self.nop((load_block, load_index));
            self.stats.loads_eliminated += 1;
        }

        if !residual.is_empty() {
            info.loads = residual;
            return false;
        }

        self.nop((store_block, store_index));
        self.stats.stores_eliminated += 1;
        self.erase_cell_alloc(cell_index);
        true
    }

    /// Fast path: every access to the cell lives in one block
    ///
    /// Each load takes the value of the nearest store above it. Declines when
    /// a load precedes every store: such a load may observe a later store
    /// through a loop back edge, which only the general path handles.
    fn rewrite_single_block(&mut self, cell_index: usize, info: &CellUsage) -> bool {
        let mut store_indices: Vec<usize> = info.stores.iter().map(|&(_, index)| index).collect();
        store_indices.sort_unstable();

        // Loads are recorded in position order, so only the first load can
        // precede every store.
        if let Some(&(_, first_load)) = info.loads.first() {
            if !store_indices.is_empty() && first_load < store_indices[0] {
                return false;
            }
        }

        for &(block, load_index) in &info.loads {
            let dest = self.load_dest((block, load_index));
            let preceding = store_indices.partition_point(|&index| index < load_index);
            let replacement = if preceding == 0 {
                // no store at all: the load reads an unspecified value
                Value::Undef
            } else {
                let value = self.store_value((block, store_indices[preceding - 1]));
                if value == Value::Operand(dest) {
                    Value::Poison
                } else {
                    value
                }
            };
            self.func.replace_all_uses(dest, replacement);
            self.nop((block, load_index));
            self.stats.loads_eliminated += 1;
        }

        for &site in &info.stores {
            self.nop(site);
            self.stats.stores_eliminated += 1;
        }
        self.erase_cell_alloc(cell_index);
        true
    }

    /// Compute the blocks the cell's value is live into
    ///
    /// Starts from the using blocks, drops those that overwrite the cell
    /// before reading it, then closes backwards over predecessors that do not
    /// themselves define the cell.
    fn compute_live_in(
        &self,
        info: &CellUsage,
        def_blocks: &FxHashSet<BasicBlockId>,
    ) -> FxHashSet<BasicBlockId> {
        let mut worklist: Vec<BasicBlockId> = info.using_blocks.clone();

        worklist.retain(|block| {
            if !def_blocks.contains(block) {
                return true;
            }
            let first_load = info
                .loads
                .iter()
                .filter(|(load_block, _)| load_block == block)
                .map(|&(_, index)| index)
                .min();
            let first_store = info
                .stores
                .iter()
                .filter(|(store_block, _)| store_block == block)
                .map(|&(_, index)| index)
                .min();
            match (first_load, first_store) {
                // the value is read before the block redefines it
                (Some(load), Some(store)) => load < store,
                (Some(_), None) => true,
                (None, _) => false,
            }
        });

        let mut live_in = FxHashSet::default();
        while let Some(block) = worklist.pop() {
            if !live_in.insert(block) {
                continue;
            }
            if let Some(preds) = self.preds.get(&block) {
                for &pred in preds {
                    if !def_blocks.contains(&pred) {
                        worklist.push(pred);
                    }
                }
            }
        }

        live_in
    }

    /// Register a phi for the cell in every block of the iterated dominance
    /// frontier of its stores
    fn place_phis(&mut self, cell_index: usize, info: &CellUsage) {
        let def_blocks: FxHashSet<BasicBlockId> =
            info.defining_blocks.iter().copied().collect();
        let live_in = self.compute_live_in(info, &def_blocks);

        // Result comes back sorted by block number, so phi ids are handed
        // out in a reproducible order.
        let phi_blocks =
            compute_iterated_dominance_frontier(&self.frontiers, &def_blocks, &live_in);
        for block in phi_blocks {
            self.insert_phi(block, cell_index);
        }
    }

    /// Insert an empty phi for the cell at the head of the block, unless one
    /// is already registered under the same (block, cell) key
    fn insert_phi(&mut self, block: BasicBlockId, cell_index: usize) {
        let key = (block.index(), cell_index);
        if self.phi_registry.contains_key(&key) {
            return;
        }

        let ty = self.cell_types[cell_index].clone();
        let phi_id = self.func.new_typed_value_id(ty.clone());
        self.func.basic_blocks[block].push_phi_front(Instruction::empty_phi(phi_id, ty));
        self.phi_registry.insert(key, phi_id);
        self.phi_to_cell.insert(phi_id, cell_index);
        self.stats.phis_inserted += 1;
    }

    /// The renaming walk over the CFG
    ///
    /// Each block's body is rewritten exactly once, but the phi update at the
    /// top runs once per incoming edge: every edge contributes one operand to
    /// the phis this pass inserted. The first successor is visited
    /// tail-style; the rest get a copy of the incoming values on a worklist.
    fn rename_walk(&mut self) {
        let initial: IncomingValues = smallvec![Value::Undef; self.cells.len()];
        let mut worklist = vec![RenameRecord {
            block: self.func.entry_block,
            pred: None,
            values: initial,
        }];

        while let Some(record) = worklist.pop() {
            let RenameRecord {
                mut block,
                mut pred,
                mut values,
            } = record;

            loop {
                if let Some(pred_block) = pred {
                    self.append_phi_operands(block, pred_block, &mut values);
                }
                if !self.visited.insert(block) {
                    break;
                }
                self.rewrite_block(block, &mut values);

                let successors = distinct_successors(&self.func.basic_blocks[block].terminator);
                let Some((&first, rest)) = successors.split_first() else {
                    break;
                };
                for &succ in rest {
                    worklist.push(RenameRecord {
                        block: succ,
                        pred: Some(block),
                        values: values.clone(),
                    });
                }
                pred = Some(block);
                block = first;
            }
        }
    }

    /// Append the incoming values for the edge(s) `pred -> block` to the
    /// phis this pass inserted in `block`
    fn append_phi_operands(
        &mut self,
        block: BasicBlockId,
        pred: BasicBlockId,
        values: &mut IncomingValues,
    ) {
        // A switch may reach `block` through several case slots; each slot
        // is an edge and contributes its own operand.
        let num_edges = edge_count(self.func, pred, block);
        debug_assert!(num_edges > 0, "walked an edge the terminator does not have");

        for instruction in self.func.basic_blocks[block].instructions.iter_mut() {
            let InstructionKind::Phi { dest, sources, .. } = &mut instruction.kind else {
                break;
            };
            // Phis that were already present before this pass are not ours
            // to fill; the registry decides.
            let Some(&cell) = self.phi_to_cell.get(dest) else {
                continue;
            };
            let incoming = values[cell];
            for _ in 0..num_edges {
                sources.push((pred, incoming));
            }
            // from here on the phi is the cell's live value
            values[cell] = Value::Operand(*dest);
        }
    }

    /// Rewrite the body of a block: loads take the cell's current value,
    /// stores set it
    fn rewrite_block(&mut self, block: BasicBlockId, values: &mut IncomingValues) {
        enum Rewrite {
            Load { dest: ValueId, cell: usize },
            Store { cell: usize, value: Value },
        }

        for index in 0..self.func.basic_blocks[block].instructions.len() {
            let action = match &self.func.basic_blocks[block].instructions[index].kind {
                InstructionKind::Load {
                    dest,
                    address: Value::Operand(address),
                    ..
                } => match self.cell_lookup.get(address) {
                    Some(&cell) => Rewrite::Load { dest: *dest, cell },
                    None => continue,
                },
                InstructionKind::Store {
                    address: Value::Operand(address),
                    value,
                    ..
                } => match self.cell_lookup.get(address) {
                    Some(&cell) => Rewrite::Store {
                        cell,
                        value: *value,
                    },
                    None => continue,
                },
                _ => continue,
            };

            match action {
                Rewrite::Load { dest, cell } => {
                    self.func.replace_all_uses(dest, values[cell]);
                    self.func.basic_blocks[block].instructions[index] = Instruction::nop();
                    self.stats.loads_eliminated += 1;
                }
                Rewrite::Store { cell, value } => {
                    values[cell] = value;
                    self.func.basic_blocks[block].instructions[index] = Instruction::nop();
                    self.stats.stores_eliminated += 1;
                }
            }
        }
    }

    /// Erase the promoted cells themselves
    ///
    /// A cell with users left at this point was referenced from unreachable
    /// code the renamer never visited; those uses become poison.
    fn erase_cells(&mut self, remaining: &[usize]) {
        for &cell_index in remaining {
            let cell = self.cells[cell_index];
            if self.func.has_uses(cell) {
                self.func.replace_all_uses(cell, Value::Poison);
            }
            self.erase_cell_alloc(cell_index);
        }
    }

    /// Erase a cell's stack allocation (in place, swept later)
    fn erase_cell_alloc(&mut self, cell_index: usize) {
        let cell = self.cells[cell_index];
        for block in self.func.basic_blocks.iter_mut() {
            for instruction in &mut block.instructions {
                if matches!(
                    &instruction.kind,
                    InstructionKind::StackAlloc { dest, .. } if *dest == cell
                ) {
                    *instruction = Instruction::nop();
                    return;
                }
            }
        }
        panic!("promoted cell %{} has no stack allocation", cell.index());
    }

    /// Physically remove every instruction erased in place so far
    fn sweep_nops(&mut self) {
        for block in self.func.basic_blocks.iter_mut() {
            block.instructions.retain(|instruction| !instruction.is_nop());
        }
    }

    /// Fold away phis that merge a single value and/or undef, to a fixpoint
    ///
    /// Iteration follows the ordered registry so the surviving def-use chains
    /// are reproducible. Structurally equal phis are never unified: the
    /// surviving phi's value may not be def-reachable from the other block.
    fn simplify_trivial_phis(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;

            let keys: Vec<(usize, usize)> = self.phi_registry.keys().copied().collect();
            for key in keys {
                let Some(&phi_id) = self.phi_registry.get(&key) else {
                    continue;
                };
                let block_id = BasicBlockId::new(key.0);

                let (same, saw_undef, phi_pos) = {
                    let block = &self.func.basic_blocks[block_id];
                    let Some(pos) = block
                        .instructions
                        .iter()
                        .position(|instruction| instruction.destination() == Some(phi_id))
                    else {
                        continue;
                    };
                    let InstructionKind::Phi { sources, .. } = &block.instructions[pos].kind
                    else {
                        continue;
                    };

                    let mut same: Option<Value> = None;
                    let mut saw_undef = false;
                    let mut trivial = true;
                    for &(_, value) in sources {
                        if value == Value::Operand(phi_id) {
                            continue; // self-edge
                        }
                        if value == Value::Undef {
                            saw_undef = true;
                            continue;
                        }
                        match same {
                            None => same = Some(value),
                            Some(existing) if existing == value => {}
                            Some(_) => {
                                trivial = false;
                                break;
                            }
                        }
                    }
                    if !trivial {
                        continue;
                    }
                    (same, saw_undef, pos)
                };

                let replacement = match same {
                    // every operand was undef (or a self-edge)
                    None => Value::Undef,
                    Some(value) => {
                        // With undef operands in the mix the replacement is
                        // only sound if the value's definition dominates the
                        // phi; otherwise the undef edges would materialize a
                        // use above the definition.
                        if saw_undef && !self.value_dominates(value, (block_id, phi_pos)) {
                            continue;
                        }
                        value
                    }
                };

                self.func.basic_blocks[block_id].remove_phi(phi_id);
                self.func.replace_all_uses(phi_id, replacement);
                self.phi_registry.remove(&key);
                self.phi_to_cell.remove(&phi_id);
                changed = true;
            }
        }
    }

    /// Checks whether a value's definition dominates the given position
    fn value_dominates(&self, value: Value, site: (BasicBlockId, usize)) -> bool {
        let Value::Operand(id) = value else {
            return true;
        };
        if self.func.is_parameter(id) {
            return true;
        }
        match self.func.definition_site(id) {
            Some(def) => self.dt.dominates_instruction(def, site),
            None => false,
        }
    }

    /// Append poison operands for predecessors the renamer never reached
    ///
    /// Such predecessors are unreachable blocks; their edges still need
    /// operands for the phi arity invariant to hold. Missing predecessors are
    /// found by multiset-differencing the sorted predecessor list against the
    /// phi's incoming blocks.
    fn fill_missing_phi_operands(&mut self) {
        let mut blocks: Vec<usize> = self.phi_registry.keys().map(|&(block, _)| block).collect();
        blocks.dedup();

        for block_index in blocks {
            let block_id = BasicBlockId::new(block_index);
            let phis: Vec<ValueId> = self
                .phi_registry
                .range((block_index, 0)..=(block_index, usize::MAX))
                .map(|(_, &phi)| phi)
                .collect();
            let Some(&first) = phis.first() else {
                continue;
            };

            let incoming_edges = self.preds.get(&block_id).map_or(0, Vec::len);
            let (incoming_count, incoming_blocks) = {
                let block = &self.func.basic_blocks[block_id];
                let Some(instruction) = block.find_phi(first) else {
                    continue;
                };
                let sources = instruction.phi_operands().unwrap_or(&[]);
                (
                    sources.len(),
                    sources.iter().map(|&(pred, _)| pred).collect::<Vec<_>>(),
                )
            };
            if incoming_count == incoming_edges {
                continue;
            }
            debug_assert!(
                incoming_count < incoming_edges,
                "phi has more operands than incoming edges"
            );

            let mut missing: Vec<BasicBlockId> =
                self.preds.get(&block_id).cloned().unwrap_or_default();
            missing.sort_unstable_by_key(|pred| pred.index());
            for incoming in incoming_blocks {
                if let Ok(pos) =
                    missing.binary_search_by_key(&incoming.index(), |pred| pred.index())
                {
                    missing.remove(pos);
                }
            }

            // All phis this pass inserted in the block were updated edge by
            // edge together, so any still showing the same count share the
            // same missing predecessors.
            for phi_id in phis {
                let block = &mut self.func.basic_blocks[block_id];
                let Some(instruction) = block.find_phi_mut(phi_id) else {
                    continue;
                };
                if instruction.phi_operands().map_or(0, |sources| sources.len())
                    != incoming_count
                {
                    continue;
                }
                for &pred in &missing {
                    instruction.add_phi_operand(pred, Value::Poison);
                }
            }
        }
    }

    // --- small site accessors ---

    fn load_dest(&self, (block, index): (BasicBlockId, usize)) -> ValueId {
        match &self.func.basic_blocks[block].instructions[index].kind {
            InstructionKind::Load { dest, .. } => *dest,
            _ => unreachable!("recorded load site does not hold a load"),
        }
    }

    fn store_value(&self, (block, index): (BasicBlockId, usize)) -> Value {
        match &self.func.basic_blocks[block].instructions[index].kind {
            InstructionKind::Store { value, .. } => *value,
            _ => unreachable!("recorded store site does not hold a store"),
        }
    }

    fn nop(&mut self, (block, index): (BasicBlockId, usize)) {
        self.func.basic_blocks[block].instructions[index] = Instruction::nop();
    }
}

#[cfg(test)]
#[path = "./mem2reg_tests.rs"]
mod tests;
