//! Data types for parsing and building the resource section.
//! The resource section contains the resource directory and the resource data.
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format#the-rsrc-section> for more information.

use std::{borrow::Borrow, collections::HashSet, mem::size_of};

use ahash::RandomState;
use debug_ignore::DebugIgnore;
use indexmap::IndexMap;
use log::{error, trace};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, types::*, util::*};

/// Type, name and language tables nest three levels deep in well-formed images.
const MAX_TABLE_DEPTH: usize = 8;
const HIGH_BIT: u32 = 0x80000000;

/// Portable executable resource directory.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceDirectory {
    pub(crate) virtual_address: u32,
    pub(crate) root:            ResourceTable,
}
impl ResourceDirectory {
    /// Parse the resource directory starting at the given file offset of the image.
    /// The virtual address is the address the directory is mapped to and is used to resolve the resource data addresses.
    ///
    /// # Returns
    /// Returns an error if the resource directory at the given offset is invalid.
    pub fn parse(
        image: &[u8], file_offset: u32, virtual_address: u32,
    ) -> Result<Self, ImageReadError> {
        let mut visited = HashSet::with_hasher(RandomState::new());
        visited.insert(0);
        let root = ResourceTable::parse(image, file_offset as u64, virtual_address, 0, 0, &mut visited)?;
        Ok(Self {
            virtual_address,
            root,
        })
    }

    /// Returns the virtual address of the resource directory in the source image.
    pub fn virtual_address(&self) -> u32 { self.virtual_address }

    /// Returns the root resource table.
    /// The root resource table contains one entry per resource type.
    pub fn root(&self) -> &ResourceTable { &self.root }

    /// Returns the size of the resulting resource directory in bytes.
    pub fn size(&self) -> u32 { self.root.size() }

    /// Build the resource directory into raw bytes to be included in an image.
    /// The virtual address is used to compute the resource data addresses and has to correspond to the address the directory is mapped to in the target image.
    pub fn build(&self, virtual_address: u32) -> Vec<u8> { self.root.build(virtual_address) }

    /// Returns the data entry stored under the type, name and language path.
    pub fn get(
        &self, resource_type: &ResourceEntryName, name: &ResourceEntryName, language: LANGID,
    ) -> Option<&ResourceData> {
        self.root
            .get(resource_type)
            .and_then(ResourceEntry::table)
            .and_then(|names| names.get(name))
            .and_then(ResourceEntry::table)
            .and_then(|languages| languages.get(ResourceEntryName::ID(language as u32)))
            .and_then(ResourceEntry::data)
    }

    /// Insert a data entry under the type, name and language path, creating missing tables.
    /// # Returns
    /// The replaced entry.
    pub fn insert(
        &mut self, resource_type: &ResourceEntryName, name: &ResourceEntryName, language: LANGID,
        data: ResourceData,
    ) -> Option<ResourceEntry> {
        self.root
            .table_entry(resource_type)
            .table_entry(name)
            .insert(ResourceEntryName::ID(language as u32), ResourceEntry::Data(data))
    }
}

/// Portable executable resource table.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceTable {
    pub(crate) data:    ResourceDirectoryTable,
    pub(crate) entries: IndexMap<ResourceEntryName, ResourceEntry>,
}
impl ResourceTable {
    fn parse(
        image: &[u8], base: u64, virtual_address: u32, table_offset: u32, level: usize,
        visited: &mut HashSet<u32, RandomState>,
    ) -> Result<Self, ImageReadError> {
        if level >= MAX_TABLE_DEPTH {
            return Err(ImageReadError::InvalidResourceDirectory(format!(
                "tables nested deeper than {} levels",
                MAX_TABLE_DEPTH
            )));
        }
        let indent = "--".repeat(level + 1);
        let table = read_at::<ResourceDirectoryTable>(image, base + table_offset as u64)?;
        trace!("{} {:#x?}", indent, table);

        let count = table.number_of_name_entries as u64 + table.number_of_id_entries as u64;
        let mut entries = IndexMap::with_capacity(count as usize);
        for index in 0..count {
            let entry_offset = base + table_offset as u64 + 16 + index * 8;
            let entry = read_at::<ResourceDirectoryEntry>(image, entry_offset)?;
            trace!("{} {:#x?}", indent, entry);

            let name = ResourceEntryName::parse(image, base, entry.name_offset_or_integer_id)?;
            let target = entry.data_entry_or_subdirectory_offset;
            if target & HIGH_BIT != 0 {
                let child_offset = target ^ HIGH_BIT;
                // every table is parsed once, shared or cyclic references are dropped
                if !visited.insert(child_offset) {
                    error!(
                        "{} resource table at {:#x?} is referenced more than once, skipping",
                        indent, child_offset
                    );
                    continue;
                }
                let table =
                    ResourceTable::parse(image, base, virtual_address, child_offset, level + 1, visited)?;
                entries.insert(name, ResourceEntry::Table(table));
                continue;
            }

            let description = read_at::<ResourceDataEntry>(image, base + target as u64)?;
            let (data_rva, size) = (description.data_rva, description.size);
            let start = (base + data_rva as u64).checked_sub(virtual_address as u64);
            let range = start.map(|start| start..start + size as u64);
            match range {
                Some(range) if range.end <= image.len() as u64 => {
                    trace!("{} {:#x?} {:#x?}", indent, range.start, description);
                    entries.insert(
                        name,
                        ResourceEntry::Data(ResourceData {
                            data:     image[range.start as usize..range.end as usize].to_vec().into(),
                            codepage: description.codepage,
                            reserved: description.reserved,
                        }),
                    );
                }
                _ => {
                    error!(
                        "{} resource data at {:#x?} with size {:#x?} outside valid range ({:#x?}), skipping",
                        indent,
                        data_rva,
                        size,
                        image.len()
                    );
                }
            }
        }
        Ok(Self {
            data: table,
            entries,
        })
    }

    fn build(&self, virtual_address: u32) -> Vec<u8> {
        let tables_size = self.tables_size();
        let descriptions_size = self.descriptions_size();
        let strings_size = aligned_to(self.strings_size(), RESOURCE_DATA_ALIGNMENT as u32);
        let mut builder = TableBuilder {
            out: vec![0; self.size() as usize],
            virtual_address,
            table_cursor: 0,
            description_cursor: tables_size,
            string_cursor: tables_size + descriptions_size,
            data_cursor: tables_size + descriptions_size + strings_size,
        };
        let offset = builder.allocate(self);
        builder.write(self, offset);
        builder.out
    }

    /// Returns the entries in the order they are written to an image:
    /// named entries sorted by name first, then id entries sorted by id.
    pub fn sorted_entries(&self) -> Vec<(&ResourceEntryName, &ResourceEntry)> {
        let mut entries = self.entries.iter().collect::<Vec<_>>();
        entries.sort_by_cached_key(|(name, _)| name.sort_key());
        entries
    }

    fn key_of(&self, name: &ResourceEntryName) -> Option<ResourceEntryName> {
        if self.entries.contains_key(name) {
            return Some(name.clone());
        }
        self.entries.keys().find(|key| key.matches(name)).cloned()
    }

    /// Get a resource entry from the table.
    /// Names are compared ignoring ASCII case.
    /// # Returns
    /// The resource entry.
    pub fn get<N: Borrow<ResourceEntryName>>(&self, name: N) -> Option<&ResourceEntry> {
        let name = name.borrow();
        self.entries
            .get(name)
            .or_else(|| self.entries.iter().find(|(key, _)| key.matches(name)).map(|(_, entry)| entry))
    }

    /// Insert a resource entry into the table.
    /// If an entry with the given name already exists, it will be replaced.
    /// # Returns
    /// The replaced entry.
    pub fn insert<N: Borrow<ResourceEntryName>>(
        &mut self, name: N, entry: ResourceEntry,
    ) -> Option<ResourceEntry> {
        let name = name.borrow();
        let key = self.key_of(name).unwrap_or_else(|| name.clone());
        self.entries.insert(key, entry)
    }

    /// Returns the child table with the given name, replacing a data entry or inserting an empty table if necessary.
    pub fn table_entry(&mut self, name: &ResourceEntryName) -> &mut ResourceTable {
        let key = self.key_of(name).unwrap_or_else(|| name.clone());
        self.entries
            .entry(key)
            .or_insert_with(|| ResourceEntry::Table(ResourceTable::default()))
            .make_table()
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns whether the table has no entries.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Returns the complete size of the table, its resources and its children in the resource directory.
    pub fn size(&self) -> u32 {
        self.tables_size()
            + self.descriptions_size()
            + aligned_to(self.strings_size(), RESOURCE_DATA_ALIGNMENT as u32)
            + self.data_size()
    }

    /// Returns the size of the table and its children in the resource directory.
    pub fn tables_size(&self) -> u32 {
        self.entries.values().map(ResourceEntry::table_size).sum::<u32>()
            + size_of::<ResourceDirectoryTable>() as u32
    }

    /// Returns the size of the names of the entries and their children in the resource directory.
    pub fn strings_size(&self) -> u32 {
        self.entries
            .iter()
            .map(|(name, entry)| name.string_size() + entry.strings_size())
            .sum::<u32>()
    }

    /// Returns the size of the data descriptions of the table's children in the resource directory.
    pub fn descriptions_size(&self) -> u32 {
        self.entries.values().map(ResourceEntry::description_size).sum::<u32>()
    }

    /// Returns the size of the aligned data of the table's children in the resource directory.
    pub fn data_size(&self) -> u32 { self.entries.values().map(ResourceEntry::data_size).sum::<u32>() }
}

/// Lays out a resource table tree in a preallocated buffer.
/// Tables come first, followed by the data descriptions, the names and the aligned data.
struct TableBuilder {
    out:                Vec<u8>,
    virtual_address:    u32,
    table_cursor:       u32,
    description_cursor: u32,
    string_cursor:      u32,
    data_cursor:        u32,
}
impl TableBuilder {
    fn put(&mut self, offset: u32, bytes: &[u8]) {
        let offset = offset as usize;
        self.out[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn allocate(&mut self, table: &ResourceTable) -> u32 {
        let offset = self.table_cursor;
        self.table_cursor += size_of::<ResourceDirectoryTable>() as u32
            + table.entries.len() as u32 * size_of::<ResourceDirectoryEntry>() as u32;
        offset
    }

    fn write(&mut self, table: &ResourceTable, offset: u32) {
        let entries = table.sorted_entries();
        let named = entries.iter().filter(|(name, _)| name.is_name()).count();
        let header = ResourceDirectoryTable {
            number_of_name_entries: named as u16,
            number_of_id_entries: (entries.len() - named) as u16,
            ..table.data
        };
        self.put(offset, header.as_bytes());

        for (index, (name, entry)) in entries.into_iter().enumerate() {
            let name_offset_or_integer_id = match name {
                ResourceEntryName::ID(id) => *id,
                ResourceEntryName::Name(_) => {
                    let string_offset = self.string_cursor;
                    let data = name.string_data();
                    self.put(string_offset, &data);
                    self.string_cursor += data.len() as u32;
                    string_offset | HIGH_BIT
                }
            };
            let data_entry_or_subdirectory_offset = match entry {
                ResourceEntry::Table(child) => {
                    let child_offset = self.allocate(child);
                    self.write(child, child_offset);
                    child_offset | HIGH_BIT
                }
                ResourceEntry::Data(data) => {
                    let description_offset = self.description_cursor;
                    self.description_cursor += size_of::<ResourceDataEntry>() as u32;
                    let data_offset = self.data_cursor;
                    self.data_cursor += entry.data_size();
                    self.put(data_offset, data.data());
                    let description = ResourceDataEntry {
                        data_rva: self.virtual_address + data_offset,
                        size:     data.data().len() as u32,
                        codepage: data.codepage,
                        reserved: data.reserved,
                    };
                    self.put(description_offset, description.as_bytes());
                    description_offset
                }
            };
            let entry = ResourceDirectoryEntry {
                name_offset_or_integer_id,
                data_entry_or_subdirectory_offset,
            };
            self.put(offset + 16 + index as u32 * 8, entry.as_bytes());
        }
    }
}

/// Raw resource data.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ResourceData {
    data:     DebugIgnore<Vec<u8>>,
    codepage: u32,
    reserved: u32,
}
impl ResourceData {
    /// Create resource data with the default codepage.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Returns the raw data.
    pub fn data(&self) -> &[u8] { &self.data }
}

/// Resource entry in a resource table.
/// This can be either a child table or raw data.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceEntry {
    Table(ResourceTable),
    Data(ResourceData),
}
impl ResourceEntry {
    fn make_table(&mut self) -> &mut ResourceTable {
        if let ResourceEntry::Data(_) = self {
            *self = ResourceEntry::Table(ResourceTable::default());
        }
        match self {
            ResourceEntry::Table(table) => table,
            ResourceEntry::Data(_) => unreachable!(),
        }
    }

    /// Returns the child table, or `None` for data entries.
    pub fn table(&self) -> Option<&ResourceTable> {
        match self {
            ResourceEntry::Table(table) => Some(table),
            ResourceEntry::Data(_) => None,
        }
    }

    /// Returns the data, or `None` for table entries.
    pub fn data(&self) -> Option<&ResourceData> {
        match self {
            ResourceEntry::Table(_) => None,
            ResourceEntry::Data(data) => Some(data),
        }
    }

    /// Returns the size of the table entry and its children in the resource directory.
    pub fn table_size(&self) -> u32 {
        match self {
            // entry + sub-table
            ResourceEntry::Table(table) => table.tables_size() + 8,
            // entry
            ResourceEntry::Data(_) => 8,
        }
    }

    /// Returns the size of the names of the entry's children in the resource directory.
    pub fn strings_size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.strings_size(),
            ResourceEntry::Data(_) => 0,
        }
    }

    /// Returns the size of the data descriptions of the entry or its children in the resource directory.
    pub fn description_size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.descriptions_size(),
            ResourceEntry::Data(_) => size_of::<ResourceDataEntry>() as u32,
        }
    }

    /// Returns the size of the aligned data of the entry or its children in the resource directory.
    pub fn data_size(&self) -> u32 {
        match self {
            ResourceEntry::Table(table) => table.data_size(),
            ResourceEntry::Data(data) => {
                aligned_to(data.data.len() as u32, RESOURCE_DATA_ALIGNMENT as u32)
            }
        }
    }
}

/// Resource directory entry name.
/// This can either be a raw id or a name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceEntryName {
    // raw id
    ID(u32),
    // UTF-16 units without length prefix
    Name(Vec<u16>),
}
impl ResourceEntryName {
    fn parse(image: &[u8], base: u64, id: u32) -> Result<Self, ReadError> {
        if id & HIGH_BIT == 0 {
            trace!("reading resource id {:#x?}", id);
            return Ok(Self::ID(id));
        }
        let address = base + (id ^ HIGH_BIT) as u64;
        let length = read_at::<u16>(image, address)? as u64;
        trace!("resource name at {:#x?} with length {}", address, length);
        let units = (0..length)
            .map(|index| read_at::<u16>(image, address + 2 + index * 2))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::Name(units))
    }

    /// Create a name entry from a string.
    pub fn from_string<S: AsRef<str>>(string: S) -> Self {
        Self::Name(string.as_ref().encode_utf16().collect())
    }

    /// Returns the decoded name, or `None` for id entries.
    pub fn name(&self) -> Option<String> {
        match self {
            Self::ID(_) => None,
            Self::Name(units) => Some(from_wide(units)),
        }
    }

    /// Returns the raw id, or `None` for name entries.
    pub fn id(&self) -> Option<u32> {
        match self {
            Self::ID(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    /// Returns whether the entry is identified by name.
    pub fn is_name(&self) -> bool { matches!(self, Self::Name(_)) }

    /// Returns whether both names refer to the same entry.
    /// Ids have to be equal, names are compared ignoring ASCII case.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ID(a), Self::ID(b)) => a == b,
            (Self::Name(a), Self::Name(b)) => wide_eq_ignore_ascii_case(a, b),
            _ => false,
        }
    }

    fn sort_key(&self) -> (bool, u32, Vec<u16>) {
        match self {
            Self::Name(units) => (false, 0, units.iter().map(|&c| ascii_upper(c)).collect()),
            Self::ID(id) => (true, *id, Vec::new()),
        }
    }

    /// Returns the size of the length-prefixed name in the resource directory.
    fn string_size(&self) -> u32 {
        match self {
            Self::ID(_) => 0,
            Self::Name(units) => 2 + units.len() as u32 * 2,
        }
    }

    fn string_data(&self) -> Vec<u8> {
        match self {
            Self::ID(_) => Vec::new(),
            Self::Name(units) => {
                let mut data = Vec::with_capacity(self.string_size() as usize);
                data.extend_from_slice(&(units.len() as u16).to_le_bytes());
                data.extend(units.iter().flat_map(|c| c.to_le_bytes()));
                data
            }
        }
    }
}
