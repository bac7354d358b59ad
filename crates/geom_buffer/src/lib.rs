//! geom_buffer: keyed, slot-based retained triangle-list storage.
//!
//! An [`ObjectBuffer`] holds a fixed number of equally sized geometry slots
//! and exposes the whole thing as one flat vertex/index pair ready for
//! upload. Every slot belongs to a keyed record; several records may share a
//! key, so a key names a *group* of primitives (all triangles of one hull
//! section, all plates of one deck cell). Disabling a key zeroes the index
//! ranges of its records, which collapses them to degenerate triangles
//! without moving any vertex data; enabling restores the saved indices.
//!
//! Capacity is a construction-time contract: builders that cannot know their
//! exact primitive count ahead of time fill a generously sized scratch
//! buffer first and then [`ObjectBuffer::absorb`] it into a tight one.

#![forbid(unsafe_code)]

use glam::{Vec2, Vec3};

/// Position/normal/UV vertex shared by every sink in the workspace.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(pos: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { pos, normal, uv }
    }
}

#[derive(Clone, Debug)]
struct ObjectData<K> {
    key: K,
    slot: usize,
    /// Indices already offset into this record's slot.
    indices: Vec<u32>,
    vertices: Vec<Vertex>,
    enabled: bool,
}

/// Fixed-slot keyed triangle-list store.
///
/// `K` is chosen per buffer instance (section ids, plate ids, object ids);
/// equality is structural and must not rely on float comparisons.
#[derive(Clone, Debug)]
pub struct ObjectBuffer<K> {
    max_objects: usize,
    verts_per_object: usize,
    inds_per_object: usize,
    slot_occupied: Vec<bool>,
    objects: Vec<ObjectData<K>>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    /// Whole-buffer visibility, independent of per-record state. Consumers
    /// skip the buffer entirely when false (deck visibility uses this).
    pub enabled: bool,
}

impl<K: Copy + PartialEq> ObjectBuffer<K> {
    pub fn new(max_objects: usize, inds_per_object: usize, verts_per_object: usize) -> Self {
        Self {
            max_objects,
            verts_per_object,
            inds_per_object,
            slot_occupied: vec![false; max_objects],
            objects: Vec::new(),
            vertices: vec![Vertex::default(); max_objects * verts_per_object],
            indices: vec![0; max_objects * inds_per_object],
            enabled: true,
        }
    }

    /// Claim the lowest free slot for one primitive record under `key`.
    ///
    /// `indices` are local to `vertices` and get offset by the slot base.
    /// Panics if the buffer is full or the lengths do not match the
    /// per-object sizes fixed at construction.
    pub fn add_object(&mut self, key: K, indices: &[u32], vertices: &[Vertex]) {
        assert_eq!(indices.len(), self.inds_per_object, "index count mismatch");
        assert_eq!(vertices.len(), self.verts_per_object, "vertex count mismatch");
        let Some(slot) = self.slot_occupied.iter().position(|occupied| !occupied) else {
            panic!("object buffer full ({} slots)", self.max_objects)
        };
        let base = (slot * self.verts_per_object) as u32;
        let absolute: Vec<u32> = indices.iter().map(|i| i + base).collect();

        let vstart = slot * self.verts_per_object;
        self.vertices[vstart..vstart + self.verts_per_object].copy_from_slice(vertices);
        let istart = slot * self.inds_per_object;
        self.indices[istart..istart + self.inds_per_object].copy_from_slice(&absolute);

        self.slot_occupied[slot] = true;
        self.objects.push(ObjectData {
            key,
            slot,
            indices: absolute,
            vertices: vertices.to_vec(),
            enabled: true,
        });
    }

    /// Zero the index range of every record matching `key`. Idempotent.
    /// Returns whether any record matched.
    pub fn disable_object(&mut self, key: K) -> bool {
        let mut found = false;
        for obj in self.objects.iter_mut().filter(|o| o.key == key) {
            obj.enabled = false;
            let istart = obj.slot * self.inds_per_object;
            self.indices[istart..istart + self.inds_per_object].fill(0);
            found = true;
        }
        found
    }

    /// Restore the saved indices of every record matching `key`. Idempotent.
    pub fn enable_object(&mut self, key: K) -> bool {
        let mut found = false;
        for obj in self.objects.iter_mut().filter(|o| o.key == key) {
            obj.enabled = true;
            let istart = obj.slot * self.inds_per_object;
            self.indices[istart..istart + self.inds_per_object].copy_from_slice(&obj.indices);
            found = true;
        }
        found
    }

    pub fn contains(&self, key: K) -> bool {
        self.objects.iter().any(|o| o.key == key)
    }

    /// Enabled state of the first record matching `key`.
    pub fn is_object_enabled(&self, key: K) -> Option<bool> {
        self.objects.iter().find(|o| o.key == key).map(|o| o.enabled)
    }

    /// Free the slots of every record matching `key` and zero their data.
    pub fn remove_object(&mut self, key: K) -> bool {
        let mut removed = false;
        let mut i = 0;
        while i < self.objects.len() {
            if self.objects[i].key == key {
                let obj = self.objects.remove(i);
                self.slot_occupied[obj.slot] = false;
                let istart = obj.slot * self.inds_per_object;
                self.indices[istart..istart + self.inds_per_object].fill(0);
                let vstart = obj.slot * self.verts_per_object;
                self.vertices[vstart..vstart + self.verts_per_object].fill(Vertex::default());
                removed = true;
            } else {
                i += 1;
            }
        }
        removed
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
        self.slot_occupied.fill(false);
        self.indices.fill(0);
        self.vertices.fill(Vertex::default());
    }

    /// Move every record of `other` into this buffer, reallocating slots and
    /// keeping per-record enabled state. Duplicate keys survive. `other` is
    /// left empty. This is the compaction step of two-pass builds.
    pub fn absorb(&mut self, other: &mut ObjectBuffer<K>) {
        assert_eq!(self.verts_per_object, other.verts_per_object);
        assert_eq!(self.inds_per_object, other.inds_per_object);
        assert!(
            self.objects.len() + other.objects.len() <= self.max_objects,
            "absorb would overflow ({} slots)",
            self.max_objects
        );
        let drained = std::mem::take(&mut other.objects);
        for obj in drained {
            let base = (obj.slot * other.verts_per_object) as u32;
            let local: Vec<u32> = obj.indices.iter().map(|i| i - base).collect();
            self.add_object(obj.key, &local, &obj.vertices);
            if !obj.enabled {
                // add_object enables; restore the record's saved state.
                let added = self.objects.len() - 1;
                self.objects[added].enabled = false;
                let istart = self.objects[added].slot * self.inds_per_object;
                self.indices[istart..istart + self.inds_per_object].fill(0);
            }
        }
        other.clear_objects();
    }

    /// Count of enabled records.
    pub fn active_objects(&self) -> usize {
        self.objects.iter().filter(|o| o.enabled).count()
    }

    /// Count of all records, enabled or not.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn max_objects(&self) -> usize {
        self.max_objects
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.objects.iter().map(|o| o.key)
    }

    /// Per-record view: key and that record's vertices, in slot order of
    /// insertion. Handy for geometric assertions and debug dumps.
    pub fn iter_objects(&self) -> impl Iterator<Item = (K, &[Vertex])> {
        self.objects.iter().map(|o| (o.key, o.vertices.as_slice()))
    }

    /// Flat vertex array, `max_objects * verts_per_object` long.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Flat index array; disabled slots hold zeroed (degenerate) ranges.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}
