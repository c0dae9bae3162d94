//! The object manager: owns the point store and the primitive arena,
//! rebuilds the linear system, and keeps every derived structure
//! (parent map, equal-distance classes, cached solution) in sync with
//! the primitive graph.
//!
//! Mutations are transactional at this layer: adding a primitive whose
//! rows conflict with the existing system rolls the board back and
//! returns [`Error::OverConstrained`]; deleting a primitive whose
//! closure contains a non-deletable member returns
//! [`Error::DeletionBlocked`] without touching anything.

use std::collections::{HashMap, HashSet};

use kurbo::Point;
use log::{debug, warn};

use crate::document::{FootprintDocument, PointRecord, PrimitiveEntry, PrimitiveRecord};
use crate::error::{Error, Result};
use crate::matrix::{LinearSystem, Solution};
use crate::points::{PointHandle, PointStore};
use crate::primitives::{Measurement, Primitive, PrimitiveId, PrimitiveKind};
use crate::units::UnitNumber;

/// Placement flags for a new primitive.
#[derive(Debug, Clone, Copy)]
pub struct AddOptions {
    /// Visible and pickable.
    pub draw: bool,
    /// Contributes rows to the linear system.
    pub constraining: bool,
    /// Re-solve immediately and roll back on conflict.
    pub check: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        AddOptions {
            draw: true,
            constraining: true,
            check: true,
        }
    }
}

impl AddOptions {
    /// Invisible child of a composite; the parent checks the combined rows.
    pub(crate) fn hidden_child() -> Self {
        AddOptions {
            draw: false,
            constraining: true,
            check: false,
        }
    }

    /// Array element: drawn, but its rows are emitted by the array.
    pub(crate) fn element() -> Self {
        AddOptions {
            draw: true,
            constraining: false,
            check: false,
        }
    }
}

/// Union-find over measurement primitives. Equal-distance groups whose
/// member sets overlap merge into one class.
#[derive(Debug, Clone, Default)]
struct DistanceClasses {
    parent: HashMap<PrimitiveId, PrimitiveId>,
}

impl DistanceClasses {
    fn find(&self, id: PrimitiveId) -> PrimitiveId {
        let mut cur = id;
        while let Some(&up) = self.parent.get(&cur) {
            if up == cur {
                break;
            }
            cur = up;
        }
        cur
    }

    fn union(&mut self, a: PrimitiveId, b: PrimitiveId) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(hi, lo);
        }
    }
}

pub struct ObjectManager {
    fp_name: String,
    default_clearance: UnitNumber,
    default_mask: UnitNumber,
    store: PointStore,
    /// Arena slot per id; deleted slots stay `None` so ids are never reused.
    arena: Vec<Option<Primitive>>,
    /// Live primitives in insertion order.
    order: Vec<PrimitiveId>,
    draw: Vec<PrimitiveId>,
    constraining: Vec<PrimitiveId>,
    suppressed: HashSet<PrimitiveId>,
    /// Child id to owning parent id, derived from the forward edges.
    parent_map: HashMap<PrimitiveId, PrimitiveId>,
    classes: DistanceClasses,
    solution: Option<Solution>,
    degrees_of_freedom: usize,
}

impl ObjectManager {
    pub fn new(fp_name: &str, default_clearance: UnitNumber, default_mask: UnitNumber) -> Self {
        ObjectManager {
            fp_name: fp_name.to_owned(),
            default_clearance,
            default_mask,
            store: PointStore::new(),
            arena: Vec::new(),
            order: Vec::new(),
            draw: Vec::new(),
            constraining: Vec::new(),
            suppressed: HashSet::new(),
            parent_map: HashMap::new(),
            classes: DistanceClasses::default(),
            solution: None,
            degrees_of_freedom: 0,
        }
    }

    pub fn fp_name(&self) -> &str {
        &self.fp_name
    }

    pub fn set_fp_name(&mut self, name: &str) {
        self.fp_name = name.to_owned();
    }

    pub fn default_clearance(&self) -> UnitNumber {
        self.default_clearance
    }

    pub fn default_mask(&self) -> UnitNumber {
        self.default_mask
    }

    pub fn points(&self) -> &PointStore {
        &self.store
    }

    /// Remaining degrees of freedom after the last successful solve.
    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    /// Live primitives in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.order.iter().copied()
    }

    /// Drawn primitives in insertion order.
    pub fn drawn(&self) -> &[PrimitiveId] {
        &self.draw
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.arena.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn prim(&self, id: PrimitiveId) -> &Primitive {
        self.arena[id.0 as usize]
            .as_ref()
            .expect("dangling primitive id")
    }

    /// Point handle of a point primitive. Panics on other kinds; callers
    /// hold ids they obtained from point primitives.
    pub fn point_handle(&self, id: PrimitiveId) -> PointHandle {
        self.prim(id).as_point().expect("not a point primitive")
    }

    pub fn has_center_point(&self) -> bool {
        self.order
            .iter()
            .any(|&id| matches!(self.prim(id).kind, PrimitiveKind::CenterPoint(_)))
    }

    pub(crate) fn alloc_point(&mut self, x: f64, y: f64) -> PointHandle {
        self.solution = None;
        self.store.alloc(x, y)
    }

    /// Move a point without re-solving. Callers follow up with
    /// [`update_points`](Self::update_points).
    pub fn set_point_coords(&mut self, handle: PointHandle, x: f64, y: f64) {
        self.solution = None;
        self.store.set_coords(handle, x, y);
    }

    // ----- mutation -------------------------------------------------------

    pub(crate) fn insert_unchecked(&mut self, prim: Primitive, opts: AddOptions) -> PrimitiveId {
        let id = PrimitiveId(self.arena.len() as u32);
        self.arena.push(Some(prim));
        self.order.push(id);
        if opts.draw {
            self.draw.push(id);
        }
        if opts.constraining {
            self.constraining.push(id);
        }
        id
    }

    /// Register a primitive. With `check` set, the system is re-solved and
    /// a conflicting primitive is removed again before the error returns.
    pub fn add_primitive(&mut self, prim: Primitive, opts: AddOptions) -> Result<PrimitiveId> {
        let check = opts.check;
        let id = self.insert_unchecked(prim, opts);
        self.rebuild_classes();
        if check {
            if let Err(err) = self.update_points(None) {
                warn!("rejecting {} #{}: {err}", self.prim(id).kind_name(), id.0);
                self.order.pop();
                self.draw.retain(|&d| d != id);
                self.constraining.retain(|&c| c != id);
                self.arena.pop();
                self.rebuild_classes();
                return Err(err);
            }
        }
        self.update_parent_map();
        Ok(id)
    }

    /// Register a composite whose children are already in the arena.
    /// On conflict the children are unwound along with the parent.
    pub(crate) fn add_composite(
        &mut self,
        prim: Primitive,
        children: &[PrimitiveId],
        opts: AddOptions,
    ) -> Result<PrimitiveId> {
        match self.add_primitive(prim, opts) {
            Ok(id) => Ok(id),
            Err(err) => {
                self.unwind(children);
                Err(err)
            }
        }
    }

    fn unwind(&mut self, ids: &[PrimitiveId]) {
        // Children of the removed entries go too (array elements own
        // their composites' points through another level).
        let mut stack: Vec<PrimitiveId> = ids.to_vec();
        while let Some(id) = stack.pop() {
            stack.extend(self.remove_entry(id));
        }
        self.rebuild_classes();
        self.update_parent_map();
        self.solution = None;
    }

    /// Remove a single entry, returning the children it owned.
    fn remove_entry(&mut self, id: PrimitiveId) -> Vec<PrimitiveId> {
        self.order.retain(|&o| o != id);
        self.draw.retain(|&o| o != id);
        self.constraining.retain(|&o| o != id);
        self.suppressed.remove(&id);
        match self.arena[id.0 as usize].take() {
            Some(prim) => {
                if let Some(h) = prim.as_point() {
                    self.store.free(h);
                }
                prim.children()
            }
            None => Vec::new(),
        }
    }

    /// Delete a primitive together with its closure: children it owns,
    /// plus everything that references a deleted primitive, to a fixpoint.
    /// Fails without effect if the closure contains a non-deletable member.
    pub fn delete_primitive(&mut self, target: PrimitiveId) -> Result<()> {
        if self.primitive(target).is_none() {
            return Err(Error::UnknownPrimitive(target.0));
        }
        let mut closure: HashSet<PrimitiveId> = HashSet::from([target]);
        loop {
            let mut added: Vec<PrimitiveId> = Vec::new();
            for &id in &closure {
                for child in self.prim(id).children() {
                    if !closure.contains(&child) {
                        added.push(child);
                    }
                }
            }
            for &id in &self.order {
                if closure.contains(&id) {
                    continue;
                }
                let p = self.prim(id);
                if p.dependencies()
                    .iter()
                    .chain(p.children().iter())
                    .any(|d| closure.contains(d))
                {
                    added.push(id);
                }
            }
            if added.is_empty() {
                break;
            }
            closure.extend(added);
        }
        if let Some(&blocked) = closure.iter().find(|&&id| !self.prim(id).can_delete()) {
            debug!(
                "deletion of #{} blocked by {} #{}",
                target.0,
                self.prim(blocked).kind_name(),
                blocked.0
            );
            return Err(Error::DeletionBlocked);
        }
        debug!("deleting {} primitives", closure.len());
        let doomed: Vec<PrimitiveId> = self
            .order
            .iter()
            .copied()
            .filter(|id| closure.contains(id))
            .collect();
        for &id in doomed.iter().rev() {
            self.remove_entry(id);
        }
        self.rebuild_classes();
        self.update_parent_map();
        self.update_points(None)
    }

    /// Drag a pickable primitive by a screen delta. Points (and the child
    /// points of a composite) move and trigger a priority re-solve;
    /// dimension labels slide their offset; other kinds ignore the drag.
    /// Returns whether anything moved.
    pub fn drag(&mut self, id: PrimitiveId, dx: f64, dy: f64) -> Result<bool> {
        enum Plan {
            MovePoints(Vec<PointHandle>),
            MoveLabel(f64),
            Inert,
        }
        let prim = self.primitive(id).ok_or(Error::UnknownPrimitive(id.0))?;
        let plan = match &prim.kind {
            PrimitiveKind::CenterPoint(_) => Plan::Inert,
            PrimitiveKind::Point(p) => Plan::MovePoints(vec![p.point]),
            PrimitiveKind::SetDistance(d) => Plan::MoveLabel(match d.axis {
                crate::primitives::Axis::Horizontal => dy,
                crate::primitives::Axis::Vertical => dx,
            }),
            PrimitiveKind::Measurement(m) => Plan::MoveLabel(match m.axis {
                crate::primitives::Axis::Horizontal => dy,
                crate::primitives::Axis::Vertical => dx,
            }),
            PrimitiveKind::Pad(_)
            | PrimitiveKind::Ball(_)
            | PrimitiveKind::Pin(_)
            | PrimitiveKind::DrawnLine(_)
            | PrimitiveKind::MarkedLine(_)
            | PrimitiveKind::Array(_) => Plan::MovePoints(prim.owned_points(self)),
            _ => Plan::Inert,
        };
        match plan {
            Plan::MovePoints(handles) => {
                for h in handles {
                    let (x, y) = self.store.coords(h);
                    self.store.set_coords(h, x + dx, y + dy);
                }
                self.update_points(Some(id))?;
                Ok(true)
            }
            Plan::MoveLabel(delta) => {
                match &mut self.arena[id.0 as usize] {
                    Some(Primitive {
                        kind: PrimitiveKind::SetDistance(d),
                        ..
                    }) => d.label_offset += delta,
                    Some(Primitive {
                        kind: PrimitiveKind::Measurement(m),
                        ..
                    }) => m.label_offset += delta,
                    _ => {}
                }
                Ok(true)
            }
            Plan::Inert => Ok(false),
        }
    }

    /// Exclude or re-include a primitive in the fabrication output. A
    /// suppressed primitive keeps constraining the geometry; only export
    /// and draw consumers skip it.
    pub fn toggle_suppressed(&mut self, id: PrimitiveId) -> Result<bool> {
        if self.primitive(id).is_none() {
            return Err(Error::UnknownPrimitive(id.0));
        }
        Ok(if self.suppressed.contains(&id) {
            self.suppressed.remove(&id);
            false
        } else {
            self.suppressed.insert(id);
            true
        })
    }

    pub fn is_suppressed(&self, id: PrimitiveId) -> bool {
        self.suppressed.contains(&id)
    }

    // ----- solving --------------------------------------------------------

    /// Rebuild and solve the linear system, then write the solved
    /// coordinates back. While dragging, the dragged primitive's points are
    /// pinned first so they keep the position the user put them at.
    pub fn update_points(&mut self, dragging: Option<PrimitiveId>) -> Result<()> {
        let unknowns = 2 * self.store.len();
        let mut sys = LinearSystem::new();
        for &id in &self.constraining {
            let prim = self.prim(id);
            for c in prim.constraints(self, id) {
                if !sys.add_constraint(&c) {
                    warn!(
                        "conflicting row from {} #{}",
                        prim.kind_name(),
                        id.0
                    );
                    return Err(Error::OverConstrained);
                }
            }
        }
        let dof = unknowns - sys.len();
        debug!(
            "{unknowns} unknowns, {} explicit rows, {dof} degrees of freedom",
            sys.len()
        );

        let mut pin_order: Vec<PointHandle> = Vec::new();
        if let Some(id) = dragging {
            pin_order.extend(self.prim(id).owned_points(self));
        }
        pin_order.extend(self.store.recency().iter().copied());
        for h in pin_order {
            if sys.len() >= unknowns {
                break;
            }
            sys.pin_point(h);
        }
        debug_assert_eq!(sys.len(), unknowns);

        let solution = sys.solution();
        let snapshot = self.store.snapshot();
        let coord = |u: usize| {
            let h = PointHandle((u / 2) as u32);
            let (x, y) = snapshot[&h];
            if u % 2 == 0 {
                x
            } else {
                y
            }
        };
        for (&h, &(x, y)) in &snapshot {
            let nx = solution.eval(h.x_unknown(), &coord).unwrap_or(x);
            let ny = solution.eval(h.y_unknown(), &coord).unwrap_or(y);
            self.store.write_coords(h, nx, ny);
        }
        self.degrees_of_freedom = dof;
        self.solution = Some(solution);
        Ok(())
    }

    // ----- derived structures ---------------------------------------------

    fn update_parent_map(&mut self) {
        let mut map = HashMap::new();
        for &id in &self.order {
            for child in self.prim(id).children() {
                map.insert(child, id);
            }
        }
        self.parent_map = map;
    }

    pub fn parent_of(&self, id: PrimitiveId) -> Option<PrimitiveId> {
        self.parent_map.get(&id).copied()
    }

    fn rebuild_classes(&mut self) {
        let mut classes = DistanceClasses::default();
        for &id in &self.order {
            if let PrimitiveKind::SameDistance(group) = &self.prim(id).kind {
                if let Some((&first, rest)) = group.members.split_first() {
                    for &m in rest {
                        classes.union(first, m);
                    }
                }
            }
        }
        self.classes = classes;
    }

    /// Rows equalizing every measurement in the caller's equivalence
    /// class. Only the lowest-numbered group of a class emits rows, so
    /// overlapping groups never duplicate them.
    pub(crate) fn same_distance_rows(
        &self,
        self_id: PrimitiveId,
        members: &[PrimitiveId],
    ) -> Vec<crate::matrix::Constraint> {
        let Some(&first) = members.first() else {
            return Vec::new();
        };
        let root = self.classes.find(first);
        let emitter = self.order.iter().copied().find(|&id| {
            match &self.prim(id).kind {
                PrimitiveKind::SameDistance(g) => g
                    .members
                    .first()
                    .is_some_and(|&m| self.classes.find(m) == root),
                _ => false,
            }
        });
        if emitter != Some(self_id) {
            return Vec::new();
        }
        let measurements: Vec<&Measurement> = self
            .order
            .iter()
            .filter_map(|&id| match &self.prim(id).kind {
                PrimitiveKind::Measurement(m) if self.classes.find(id) == root => Some(m),
                _ => None,
            })
            .collect();
        let mut rows = Vec::new();
        if let Some((reference, rest)) = measurements.split_first() {
            let ref_terms = reference.span_terms(self, 1.0);
            for other in rest {
                let mut terms = ref_terms.clone();
                terms.extend(other.span_terms(self, -1.0));
                rows.push(crate::matrix::Constraint::new(terms, 0.0));
            }
        }
        rows
    }

    // ----- picking --------------------------------------------------------

    /// Primitives within `radius` of the cursor, closest first. Hidden
    /// child points take part so a pad corner stays grabbable through the
    /// pad. Distances are squared and biased so points outrank interiors.
    pub fn all_within(&self, cursor: Point, radius: f64) -> Vec<(f64, PrimitiveId)> {
        let r2 = radius * radius;
        let mut hits: Vec<(f64, PrimitiveId)> = self
            .order
            .iter()
            .filter_map(|&id| {
                self.prim(id)
                    .distance_to(self, cursor)
                    .filter(|&d| d <= r2)
                    .map(|d| (d, id))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits
    }

    pub fn closest(&self, cursor: Point, radius: f64) -> Option<PrimitiveId> {
        self.all_within(cursor, radius).first().map(|&(_, id)| id)
    }

    // ----- attribute inheritance ------------------------------------------

    /// Pin/pad number: explicit meta first, then the parent chain; an
    /// array parent answers from its numbering scheme.
    pub fn number_of(&self, id: PrimitiveId) -> Option<String> {
        let mut cur = id;
        loop {
            if let Some(n) = &self.prim(cur).meta.number {
                return Some(n.clone());
            }
            let parent = self.parent_of(cur)?;
            if let PrimitiveKind::Array(arr) = &self.prim(parent).kind {
                if let Some((i, j)) = arr.cell_of(cur) {
                    if let Some(label) = arr.numbering.label(i, j) {
                        return Some(label);
                    }
                }
            }
            cur = parent;
        }
    }

    /// Copper clearance, inherited up the parent chain with the board
    /// default as the last resort.
    pub fn clearance_of(&self, id: PrimitiveId) -> UnitNumber {
        let mut cur = id;
        loop {
            if let Some(c) = self.prim(cur).meta.clearance {
                return c;
            }
            match self.parent_of(cur) {
                Some(p) => cur = p,
                None => return self.default_clearance,
            }
        }
    }

    /// Solder mask relief, inherited like clearance.
    pub fn mask_of(&self, id: PrimitiveId) -> UnitNumber {
        let mut cur = id;
        loop {
            if let Some(m) = self.prim(cur).meta.mask {
                return m;
            }
            match self.parent_of(cur) {
                Some(p) => cur = p,
                None => return self.default_mask,
            }
        }
    }

    pub fn set_number(&mut self, id: PrimitiveId, number: Option<String>) -> Result<()> {
        self.meta_mut(id)?.number = number;
        Ok(())
    }

    pub fn set_clearance(&mut self, id: PrimitiveId, clearance: Option<UnitNumber>) -> Result<()> {
        self.meta_mut(id)?.clearance = clearance;
        Ok(())
    }

    pub fn set_mask(&mut self, id: PrimitiveId, mask: Option<UnitNumber>) -> Result<()> {
        self.meta_mut(id)?.mask = mask;
        Ok(())
    }

    fn meta_mut(&mut self, id: PrimitiveId) -> Result<&mut crate::primitives::Meta> {
        self.arena
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .map(|p| &mut p.meta)
            .ok_or(Error::UnknownPrimitive(id.0))
    }

    // ----- persistence ----------------------------------------------------

    /// Serialize into a document. Primitives are emitted in insertion
    /// order with dependencies written as list indices, which is already
    /// a topological order for reloading.
    pub fn to_document(&self) -> FootprintDocument {
        let index_of: HashMap<PrimitiveId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        let primitives = self
            .order
            .iter()
            .enumerate()
            .map(|(index, &id)| {
                let prim = self.prim(id);
                PrimitiveEntry {
                    index,
                    meta: prim.meta.clone(),
                    record: PrimitiveRecord::from_primitive(prim, &index_of),
                }
            })
            .collect();
        let points = self
            .store
            .recency()
            .iter()
            .map(|&h| {
                let (x, y) = self.store.coords(h);
                PointRecord { index: h.0, x, y }
            })
            .collect();
        let mut suppressed: Vec<usize> = self.suppressed.iter().map(|id| index_of[id]).collect();
        suppressed.sort_unstable();
        FootprintDocument {
            fp_name: self.fp_name.clone(),
            default_clearance: self.default_clearance,
            default_mask: self.default_mask,
            next_point_index: self.store.next_index(),
            points,
            primitives,
            draw: self.draw.iter().map(|id| index_of[id]).collect(),
            constraining: self.constraining.iter().map(|id| index_of[id]).collect(),
            suppressed,
        }
    }

    /// Rebuild a manager from a document. Primitives are materialized to a
    /// fixpoint over their dependency indices, so documents whose entries
    /// were reordered still load; truly circular references fail.
    pub fn from_document(doc: &FootprintDocument) -> Result<ObjectManager> {
        let coords: HashMap<PointHandle, (f64, f64)> = doc
            .points
            .iter()
            .map(|p| (PointHandle(p.index), (p.x, p.y)))
            .collect();
        let recency: Vec<PointHandle> = doc.points.iter().map(|p| PointHandle(p.index)).collect();
        let mut om = ObjectManager::new(&doc.fp_name, doc.default_clearance, doc.default_mask);
        om.store = PointStore::restore(doc.next_point_index, coords, recency);

        let n = doc.primitives.len();
        let mut entries: Vec<Option<&PrimitiveEntry>> = vec![None; n];
        for entry in &doc.primitives {
            if entry.index >= n || entries[entry.index].is_some() {
                return Err(Error::Serialization(format!(
                    "bad primitive index {}",
                    entry.index
                )));
            }
            entries[entry.index] = Some(entry);
        }
        let mut built: Vec<Option<PrimitiveId>> = vec![None; n];
        let mut remaining = n;
        while remaining > 0 {
            let mut progressed = false;
            for index in 0..n {
                if built[index].is_some() {
                    continue;
                }
                let entry = entries[index].ok_or_else(|| {
                    Error::Serialization(format!("missing primitive index {index}"))
                })?;
                let deps = entry.record.deps();
                if !deps.iter().all(|&d| d < n && built[d].is_some()) {
                    continue;
                }
                let kind = entry.record.instantiate(&built, &om.store)?;
                let id = PrimitiveId(om.arena.len() as u32);
                om.arena.push(Some(Primitive {
                    meta: entry.meta.clone(),
                    kind,
                }));
                built[index] = Some(id);
                remaining -= 1;
                progressed = true;
            }
            if !progressed {
                return Err(Error::Serialization(
                    "unresolvable primitive dependencies".into(),
                ));
            }
        }
        let resolve = |index: usize| -> Result<PrimitiveId> {
            built
                .get(index)
                .copied()
                .flatten()
                .ok_or_else(|| Error::Serialization(format!("bad primitive index {index}")))
        };
        om.order = (0..n).map(resolve).collect::<Result<_>>()?;
        om.draw = doc.draw.iter().map(|&i| resolve(i)).collect::<Result<_>>()?;
        om.constraining = doc
            .constraining
            .iter()
            .map(|&i| resolve(i))
            .collect::<Result<_>>()?;
        om.suppressed = doc
            .suppressed
            .iter()
            .map(|&i| resolve(i))
            .collect::<Result<_>>()?;
        om.rebuild_classes();
        om.update_parent_map();
        om.update_points(None)?;
        Ok(om)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_document().to_json()
    }

    pub fn from_json(json: &str) -> Result<ObjectManager> {
        Self::from_document(&FootprintDocument::from_json(json)?)
    }
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("fp_name", &self.fp_name)
            .field("points", &self.store.len())
            .field("primitives", &self.order.len())
            .field("degrees_of_freedom", &self.degrees_of_freedom)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{
        Alignment, Axis, Coincidence, FreePoint, Pad, PadParams, SetDistance,
    };
    use crate::units::Unit;

    fn manager() -> ObjectManager {
        let _ = env_logger::builder().is_test(true).try_init();
        ObjectManager::new(
            "test",
            UnitNumber::new(10.0, Unit::Mil),
            UnitNumber::new(10.0, Unit::Mil),
        )
    }

    fn iu(v: f64) -> UnitNumber {
        UnitNumber::new(v, Unit::Iu)
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(60.0)).unwrap();
        Pad::create(&mut om, 12.0, 34.0, &params).unwrap();
        om.update_points(None).unwrap();
        let before = om.points().snapshot();
        om.update_points(None).unwrap();
        let after = om.points().snapshot();
        for (h, &(x, y)) in &before {
            let (x2, y2) = after[h];
            assert!((x - x2).abs() < 1e-9 && (y - y2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_over_constrained_add_rolls_back() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 100.0, 0.0).unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(100.0)).unwrap();
        let json_before = om.to_json().unwrap();
        let err = SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(150.0));
        assert!(matches!(err, Err(Error::OverConstrained)));
        assert_eq!(om.to_json().unwrap(), json_before);
        // The surviving constraint still solves.
        om.update_points(None).unwrap();
    }

    #[test]
    fn test_conflicting_composite_unwinds_children() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 100.0, 0.0).unwrap();
        Coincidence::create(&mut om, a, b).unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(50.0)).unwrap_err();
        assert_eq!(om.iter().count(), 3);
        assert_eq!(om.points().len(), 2);
    }

    #[test]
    fn test_dof_accounting() {
        let mut om = manager();
        assert_eq!(om.degrees_of_freedom(), 0);
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        assert_eq!(om.degrees_of_freedom(), 2);
        let b = FreePoint::create(&mut om, 10.0, 10.0).unwrap();
        assert_eq!(om.degrees_of_freedom(), 4);
        Alignment::create(&mut om, Axis::Horizontal, a, b).unwrap();
        assert_eq!(om.degrees_of_freedom(), 3);
    }

    #[test]
    fn test_drag_pins_dragged_point() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 100.0, 0.0).unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(100.0)).unwrap();
        om.drag(a, 5.0, 7.0).unwrap();
        let (ax, ay) = om.points().coords(om.point_handle(a));
        let (bx, _) = om.points().coords(om.point_handle(b));
        assert!((ax - 5.0).abs() < 1e-9);
        assert!((ay - 7.0).abs() < 1e-9);
        assert!((bx - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_closest_prefers_points_over_interiors() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let pad = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        // The nearest child point (the center, 50 squared away) loses to
        // the interior bias, so the pad itself wins.
        let hit = om.closest(Point::new(5.0, 5.0), 30.0).unwrap();
        assert_eq!(hit, pad);
        let p = FreePoint::create(&mut om, 6.0, 5.0).unwrap();
        let hit = om.closest(Point::new(5.0, 5.0), 30.0).unwrap();
        assert_eq!(hit, p);
    }

    #[test]
    fn test_hidden_pad_corner_is_pickable() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let pad = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        // On the corner itself the hidden child point outranks the pad
        // interior, which is what makes pads resizable.
        let hit = om.closest(Point::new(-50.0, -50.0), 5.0).unwrap();
        assert_ne!(hit, pad);
        let h = om.primitive(hit).unwrap().as_point().unwrap();
        assert_eq!(om.points().coords(h), (-50.0, -50.0));
    }

    #[test]
    fn test_drag_moves_whole_pad() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let pad = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        assert!(om.drag(pad, 25.0, 10.0).unwrap());
        let Some(PrimitiveKind::Pad(p)) = om.primitive(pad).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        let (center, corner_lo, corner_hi) = (p.center(), p.points[0], p.points[8]);
        let (cx, cy) = om.points().coords(om.point_handle(center));
        assert!((cx - 25.0).abs() < 1e-9 && (cy - 10.0).abs() < 1e-9);
        // The pad translates rigidly, keeping its size.
        assert_eq!(om.points().coords(om.point_handle(corner_lo)), (-25.0, -40.0));
        assert_eq!(om.points().coords(om.point_handle(corner_hi)), (75.0, 60.0));
    }

    #[test]
    fn test_suppression_keeps_constraining() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 60.0, 0.0).unwrap();
        let d = SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(100.0)).unwrap();
        assert!(om.toggle_suppressed(d).unwrap());
        assert!(om.is_suppressed(d));
        // Suppression hides the primitive from export; its rows stay.
        om.update_points(None).unwrap();
        assert_eq!(om.degrees_of_freedom(), 3);
        let (ax, _) = om.points().coords(om.point_handle(a));
        let (bx, _) = om.points().coords(om.point_handle(b));
        assert!((bx - ax - 100.0).abs() < 1e-9);
        assert!(!om.toggle_suppressed(d).unwrap());
        assert!(!om.is_suppressed(d));
    }

    #[test]
    fn test_document_roundtrip() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(60.0)).unwrap();
        let pad = Pad::create(&mut om, 10.0, 20.0, &params).unwrap();
        om.set_number(pad, Some("3".into())).unwrap();
        let a = FreePoint::create(&mut om, -50.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 50.0, 0.0).unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, a, b, iu(100.0)).unwrap();
        let json = om.to_json().unwrap();
        let om2 = ObjectManager::from_json(&json).unwrap();
        assert_eq!(om2.iter().count(), om.iter().count());
        assert_eq!(om2.points().len(), om.points().len());
        assert_eq!(om2.to_json().unwrap(), json);
    }

    #[test]
    fn test_pad_distance_scenario() {
        let mut om = manager();
        crate::primitives::CenterPoint::create(&mut om).unwrap();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let pad = Pad::create(&mut om, 100.0, 100.0, &params).unwrap();
        let Some(PrimitiveKind::Pad(p)) = om.primitive(pad).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        let (pad_center, corner_lo, corner_hi) = (p.center(), p.points[0], p.points[8]);
        assert_eq!(om.points().coords(om.point_handle(pad_center)), (100.0, 100.0));
        assert_eq!(om.points().coords(om.point_handle(corner_lo)), (50.0, 50.0));
        assert_eq!(om.points().coords(om.point_handle(corner_hi)), (150.0, 150.0));
        // Origin fixed, pad position and size free.
        assert_eq!(om.degrees_of_freedom(), 4);

        let origin = om.iter().next().unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, origin, pad_center, iu(200.0)).unwrap();
        let (cx, cy) = om.points().coords(om.point_handle(pad_center));
        assert!((cx - 200.0).abs() < 1e-6);
        assert!((cy - 100.0).abs() < 1e-6);
        assert_eq!(om.degrees_of_freedom(), 3);
    }

    #[test]
    fn test_number_inheritance() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(60.0)).unwrap();
        let pad = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        assert_eq!(om.number_of(pad), None);
        om.set_number(pad, Some("7".into())).unwrap();
        assert_eq!(om.number_of(pad), Some("7".into()));
        // Children answer through the parent chain.
        let Some(PrimitiveKind::Pad(p)) = om.primitive(pad).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        let corner = p.points[0];
        assert_eq!(om.number_of(corner), Some("7".into()));
    }

    #[test]
    fn test_clearance_falls_back_to_default() {
        let mut om = manager();
        let p = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        assert_eq!(om.clearance_of(p), UnitNumber::new(10.0, Unit::Mil));
        om.set_clearance(p, Some(iu(42.0))).unwrap();
        assert_eq!(om.clearance_of(p), iu(42.0));
    }
}
