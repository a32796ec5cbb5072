//! Portable executable image representation.
//!
//! See <https://learn.microsoft.com/en-us/windows/win32/debug/pe-format> for more information.

use std::{borrow::Cow, path::Path};

use ahash::RandomState;
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use zerocopy::IntoBytes;

use crate::{constants::*, errors::*, resource::*, types::*, util::*};

/// Image data directory type enumeration.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DataDirectoryType {
    ExportTable,
    ImportTable,
    ResourceTable,
    ExceptionTable,
    CertificateTable,
    BaseRelocationTable,
    Debug,
    Architecture,
    GlobalPtr,
    TLSTable,
    LoadConfigTable,
    BoundImport,
    IAT,
    DelayImportDescriptor,
    CLRRuntimeHeader,
    Reserved,
}

use DataDirectoryType::*;

const DATA_DIRECTORY_TYPES: [DataDirectoryType; 16] = [
    ExportTable,
    ImportTable,
    ResourceTable,
    ExceptionTable,
    CertificateTable,
    BaseRelocationTable,
    Debug,
    Architecture,
    GlobalPtr,
    TLSTable,
    LoadConfigTable,
    BoundImport,
    IAT,
    DelayImportDescriptor,
    CLRRuntimeHeader,
    Reserved,
];

const SECTION_HEADER_SIZE: u64 = 40;
const DATA_DIRECTORY_SIZE: u64 = 8;

/// Portable executable image representation.
///
/// This struct is used by the portable platform to locate, replace and write the resource section of an image.
#[derive(Debug, Clone)]
pub struct Image<'a> {
    pub(crate) image: Cow<'a, [u8]>,

    pub(crate) coff_header:           CoffHeader,
    pub(crate) standard_header:       StandardHeader,
    pub(crate) windows_header:        GenericWindowsHeader,
    pub(crate) header_data_directory: IndexMap<DataDirectoryType, ImageDataDirectory, RandomState>,
    pub(crate) section_table:         Vec<SectionHeader>,

    pub(crate) resource_directory: Option<ResourceDirectory>,

    coff_header_offset:        u64,
    windows_header_offset:     u64,
    optional_header_dd_offset: u64,
    section_table_offset:      u64,
    directories_offset:        u64,
}

impl<'a> Image<'a> {
    /// Parse a portable executable image from a byte slice.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the byte slice is not a valid portable executable image or is missing required headers.
    pub fn parse<R: Into<Cow<'a, [u8]>>>(image: R) -> Result<Self, ImageReadError> {
        let image = image.into();

        let pe_dos_magic = read_at::<u16>(&image, 0)?;
        debug!("pe_dos_magic: {:#x?}", pe_dos_magic);
        if pe_dos_magic != PE_DOS_MAGIC {
            return Err(ImageReadError::InvalidHeader("no dos magic".into()));
        }

        let pe_signature_offset = read_at::<u32>(&image, PE_PTR_OFFSET as u64)? as u64;
        debug!("pe_signature_offset: {:#x?}", pe_signature_offset);

        let pe_signature = read_at::<u32>(&image, pe_signature_offset)?;
        if pe_signature != PE_NT_SIGNATURE {
            return Err(ImageReadError::InvalidHeader("no pe signature".into()));
        }

        let coff_header_offset = pe_signature_offset + 4;
        let coff_header = read_at::<CoffHeader>(&image, coff_header_offset)?;
        debug!("{:#x?}: {:#x?}", coff_header_offset, coff_header);
        if coff_header.size_of_optional_header < 24 {
            return Err(ImageReadError::InvalidHeader("optional header too small".into()));
        }

        let standard_header_offset = coff_header_offset + 20;
        let standard_header = read_at::<StandardHeader>(&image, standard_header_offset)?;
        debug!("{:#x?}: {:#x?}", standard_header_offset, standard_header);

        // PE32 images carry an additional base of data field before the windows header
        let (windows_header, windows_header_offset, optional_header_dd_offset) = {
            if standard_header.magic == PE_32_MAGIC && coff_header.size_of_optional_header >= 96 {
                let offset = standard_header_offset + 28;
                let header = read_at::<WindowsHeader<u32>>(&image, offset)?;
                (GenericWindowsHeader::WindowsHeader32(header), offset, standard_header_offset + 96)
            } else if standard_header.magic == PE_64_MAGIC
                && coff_header.size_of_optional_header >= 112
            {
                let offset = standard_header_offset + 24;
                let header = read_at::<WindowsHeader<u64>>(&image, offset)?;
                (GenericWindowsHeader::WindowsHeader64(header), offset, standard_header_offset + 112)
            } else {
                return Err(ImageReadError::InvalidHeader("invalid optional header".into()));
            }
        };
        debug!("windows header: {:#x?}", windows_header);

        let section_table_offset =
            standard_header_offset + coff_header.size_of_optional_header as u64;
        let number_of_rva_and_sizes = windows_header.number_of_rva_and_sizes();
        let directories_end = optional_header_dd_offset
            + (number_of_rva_and_sizes.min(16) as u64) * DATA_DIRECTORY_SIZE;
        if directories_end > section_table_offset {
            return Err(ImageReadError::InvalidHeader(
                "data directories exceed optional header".into(),
            ));
        }

        let mut header_data_directory =
            IndexMap::<DataDirectoryType, ImageDataDirectory, _>::with_hasher(RandomState::new());
        for (index, &directory) in DATA_DIRECTORY_TYPES.iter().enumerate() {
            if (index as u32) < number_of_rva_and_sizes {
                let offset = optional_header_dd_offset + index as u64 * DATA_DIRECTORY_SIZE;
                let data = read_at::<ImageDataDirectory>(&image, offset)?;
                header_data_directory.insert(directory, data);
                debug!("{:#x?}: {:?}: {:#x?}", offset, directory, data);
            }
        }

        let mut section_table = Vec::with_capacity(coff_header.number_of_sections as usize);
        for index in 0..coff_header.number_of_sections as u64 {
            let offset = section_table_offset + index * SECTION_HEADER_SIZE;
            let section_header = read_at::<SectionHeader>(&image, offset)?;
            debug!(
                "{:#x?}: {}: {:#x?}",
                offset,
                section_header.name().unwrap_or_else(|| "?".to_string()),
                section_header
            );
            section_table.push(section_header);
        }
        let directories_offset =
            section_table_offset + coff_header.number_of_sections as u64 * SECTION_HEADER_SIZE;

        let mut resource_directory = None;
        if let Some(resource_data) = header_data_directory.get(&ResourceTable) {
            let (virtual_address, size) = (resource_data.virtual_address, resource_data.size);
            if virtual_address > 0 && size > 0 {
                let section = section_table
                    .iter()
                    .find(|section| section.contains_rva(virtual_address))
                    .ok_or_else(|| {
                        ImageReadError::InvalidSection(format!(
                            "no section contains the resource directory at {:#x?}",
                            virtual_address
                        ))
                    })?;
                debug!(
                    "found resource directory in {} section: {:#x?}",
                    section.name().unwrap_or_else(|| "?".to_string()),
                    section
                );
                let file_offset = section
                    .pointer_to_raw_data
                    .checked_add(virtual_address - section.virtual_address)
                    .ok_or_else(|| {
                        ImageReadError::InvalidSection("resource directory offset overflows".into())
                    })?;
                resource_directory =
                    Some(ResourceDirectory::parse(&image, file_offset, virtual_address)?);
            }
        }

        Ok(Self {
            image,
            coff_header,
            standard_header,
            windows_header,
            header_data_directory,
            section_table,
            resource_directory,
            coff_header_offset,
            windows_header_offset,
            optional_header_dd_offset,
            section_table_offset,
            directories_offset,
        })
    }

    /// Parse a portable executable image from a file.
    ///
    /// # Returns
    /// Returns the `Image`, or an error if the file could not be read, is not a valid portable executable image or is missing required headers.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Image<'static>, ImageReadError> {
        let data = std::fs::read(path)?;
        Image::parse(data)
    }

    /// Write the portable executable image to a writer.
    ///
    /// # Returns
    /// Returns an error if the writer could not be written.
    pub fn write_writer<W: std::io::Write>(&self, writer: &mut W) -> Result<(), ImageWriteError> {
        writer.write_all(&self.image).map_err(|e| e.into())
    }

    /// Set the resource directory of the image.
    ///
    /// This will update the resource data directory and the resource section.
    /// The existing resource section is rebuilt in place if the following conditions are met:
    /// - The directory starts at the beginning of the section.
    /// - The section is not used by other data directories.
    /// - The new directory fits into the raw data of the section, or the section is the last section in the image.
    ///
    /// Otherwise, the existing section is kept intact and a new section is added after all other sections and before any trailing data.
    ///
    /// # Returns
    /// Returns the previous resource directory, or an error in the following cases:
    /// - Returns an error if there is not enough space in the image header to add a new section.
    /// - Returns an error if a section points to data outside the image.
    pub fn set_resource_directory(
        &mut self, mut resource_directory: ResourceDirectory,
    ) -> Result<Option<ResourceDirectory>, ImageWriteError> {
        // copy to-be-modified data to allow erroring out without invalidating the image
        let mut coff_header = self.coff_header;
        let mut windows_header = self.windows_header;
        let mut header_data_directory = self.header_data_directory.clone();
        let mut section_table = self.section_table.clone();

        let section_alignment = windows_header.section_alignment().max(1);
        let file_alignment = windows_header.file_alignment().max(1);
        let image_len = self.image.len() as u64;

        let old_directory_count = header_data_directory.len() as u64;
        for &directory in &DATA_DIRECTORY_TYPES[..=ResourceTable as usize] {
            if !header_data_directory.contains_key(&directory) {
                debug!("adding missing header data directory: {:?}", directory);
                header_data_directory.insert(directory, ImageDataDirectory::default());
            }
        }
        let added_directories = header_data_directory.len() as u64 - old_directory_count;
        coff_header.size_of_optional_header += (added_directories * DATA_DIRECTORY_SIZE) as u16;
        let mut required_header_space = added_directories * DATA_DIRECTORY_SIZE;

        let old_resource_data_directory =
            header_data_directory.get(&ResourceTable).copied().unwrap_or_default();
        let new_size = resource_directory.size();
        debug!("new resource directory size: {:#x?}", new_size);

        let sections_with_data = || section_table.iter().filter(|section| section.size_of_raw_data > 0);
        let first_section_start = sections_with_data()
            .map(|section| section.pointer_to_raw_data as u64)
            .min()
            .unwrap_or(image_len);
        let last_section_end =
            sections_with_data().map(SectionHeader::raw_end).max().unwrap_or(image_len);
        let last_virtual_end = section_table.iter().map(SectionHeader::virtual_end).max();
        if last_section_end > image_len {
            return Err(ImageWriteError::InvalidSectionRange(last_section_end, image_len));
        }
        if first_section_start < self.directories_offset {
            return Err(ImageWriteError::InvalidSectionRange(
                self.directories_offset,
                first_section_start,
            ));
        }

        let reusable_section = if old_resource_data_directory.size > 0 {
            self.reusable_resource_section(
                &old_resource_data_directory,
                new_size,
                first_section_start,
                last_section_end,
            )
        } else {
            None
        };

        // file offsets of the trailing data before and after the rebuild
        let old_tail_start;
        let new_tail_start;
        let body = match reusable_section {
            Some(index) => {
                let section = &mut section_table[index];
                let section_start = section.pointer_to_raw_data as u64;
                let section_end = section.raw_end();
                let is_last = section_end == last_section_end
                    && Some(section.virtual_end()) == last_virtual_end;

                let mut section_data = resource_directory.build(section.virtual_address);
                if is_last {
                    debug!("resource section is the last section, resizing it");
                    pad_to(&mut section_data, file_alignment as usize);
                    section.size_of_raw_data = section_data.len() as u32;
                    section.virtual_size = new_size;
                } else {
                    debug!("resource directory fits into the existing section, overwriting it");
                    section_data.resize(section.size_of_raw_data as usize, 0);
                    let virtual_size = section.virtual_size;
                    section.virtual_size = virtual_size.max(new_size);
                }
                resource_directory.virtual_address = section.virtual_address;
                old_tail_start = section_end;
                new_tail_start = section_start + section_data.len() as u64;

                let mut body = Vec::with_capacity(
                    (image_len - first_section_start) as usize + section_data.len(),
                );
                body.extend_from_slice(
                    &self.image[first_section_start as usize..section_start as usize],
                );
                body.extend_from_slice(&section_data);
                body.extend_from_slice(&self.image[section_end as usize..]);
                body
            }
            None => {
                debug!("adding new resource section");
                let virtual_address = aligned_to(
                    last_virtual_end.unwrap_or(section_alignment as u64),
                    section_alignment as u64,
                ) as u32;
                let pointer_to_raw_data = aligned_to(last_section_end, file_alignment as u64);

                let mut section_data = resource_directory.build(virtual_address);
                pad_to(&mut section_data, file_alignment as usize);
                if pointer_to_raw_data + section_data.len() as u64 > u32::MAX as u64 {
                    return Err(ImageWriteError::ResourceDirectoryTooLarge(
                        section_data.len() as u64,
                    ));
                }
                resource_directory.virtual_address = virtual_address;

                let name = if section_table.iter().any(|section| section.name().as_deref() == Some(".rsrc")) {
                    ".rsrc1"
                } else {
                    ".rsrc"
                };
                section_table.push(SectionHeader {
                    name: SectionHeader::encode_name(name),
                    virtual_size: new_size,
                    virtual_address,
                    size_of_raw_data: section_data.len() as u32,
                    pointer_to_raw_data: pointer_to_raw_data as u32,
                    characteristics: IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ,
                    ..SectionHeader::default()
                });
                coff_header.number_of_sections += 1;
                required_header_space += SECTION_HEADER_SIZE;
                old_tail_start = last_section_end;
                new_tail_start = pointer_to_raw_data + section_data.len() as u64;

                let mut body = Vec::with_capacity(
                    (pointer_to_raw_data - first_section_start) as usize + section_data.len(),
                );
                body.extend_from_slice(
                    &self.image[first_section_start as usize..last_section_end as usize],
                );
                body.resize((pointer_to_raw_data - first_section_start) as usize, 0);
                body.extend_from_slice(&section_data);
                body.extend_from_slice(&self.image[last_section_end as usize..]);
                body
            }
        };

        let available_space = first_section_start - self.directories_offset;
        debug!("available header space: {:#x?}", available_space);
        debug!("required additional header space: {:#x?}", required_header_space);
        if required_header_space > available_space {
            error!(
                "not enough space in header to add new section ({} > {})",
                required_header_space, available_space
            );
            return Err(ImageWriteError::NotEnoughSpaceInHeader(
                required_header_space,
                available_space,
            ));
        }

        // the certificate table is addressed by file offset and moves with the trailing data
        if let Some(certificate_dd) = header_data_directory.get_mut(&CertificateTable) {
            let (offset, size) = (certificate_dd.virtual_address as u64, certificate_dd.size);
            if size > 0 && offset >= old_tail_start && new_tail_start != old_tail_start {
                let moved = offset - old_tail_start + new_tail_start;
                debug!("moving certificate table from {:#x?} to {:#x?}", offset, moved);
                certificate_dd.virtual_address = u32::try_from(moved)
                    .map_err(|_| ImageWriteError::InvalidSectionRange(moved, u32::MAX as u64))?;
            }
        }
        if let Some(resource_dd) = header_data_directory.get_mut(&ResourceTable) {
            resource_dd.virtual_address = resource_directory.virtual_address;
            resource_dd.size = new_size;
        }
        let size_of_image = section_table
            .iter()
            .map(SectionHeader::virtual_end)
            .max()
            .map(|end| aligned_to(end, section_alignment as u64) as u32)
            .unwrap_or_else(|| windows_header.size_of_image());
        windows_header.update_layout(size_of_image, header_data_directory.len() as u32);

        let old_directories_end =
            self.optional_header_dd_offset + old_directory_count * DATA_DIRECTORY_SIZE;
        let mut new_image = Vec::with_capacity(first_section_start as usize + body.len());
        new_image.extend_from_slice(&self.image[..self.coff_header_offset as usize]);
        new_image.extend_from_slice(coff_header.as_bytes());
        new_image.extend_from_slice(self.standard_header.as_bytes());
        new_image.extend_from_slice(
            &self.image[(self.coff_header_offset + 44) as usize..self.windows_header_offset as usize],
        );
        new_image.extend_from_slice(windows_header.as_bytes());
        for data in header_data_directory.values() {
            new_image.extend_from_slice(data.as_bytes());
        }
        new_image.extend_from_slice(
            &self.image[old_directories_end as usize..self.section_table_offset as usize],
        );
        for section_header in section_table.iter() {
            new_image.extend_from_slice(section_header.as_bytes());
        }
        new_image.extend_from_slice(
            &self.image
                [(self.directories_offset + required_header_space) as usize..first_section_start as usize],
        );
        new_image.extend_from_slice(&body);

        self.section_table_offset += added_directories * DATA_DIRECTORY_SIZE;
        self.directories_offset =
            self.section_table_offset + section_table.len() as u64 * SECTION_HEADER_SIZE;
        self.coff_header = coff_header;
        self.windows_header = windows_header;
        self.header_data_directory = header_data_directory;
        self.section_table = section_table;
        self.image = new_image.into();

        Ok(self.resource_directory.replace(resource_directory))
    }

    /// Returns the index of the section holding the current resource directory if it can be rebuilt in place.
    fn reusable_resource_section(
        &self, resource_dd: &ImageDataDirectory, new_size: u32, first_section_start: u64,
        last_section_end: u64,
    ) -> Option<usize> {
        let virtual_address = resource_dd.virtual_address;
        let index =
            self.section_table.iter().position(|section| section.contains_rva(virtual_address))?;
        let section = &self.section_table[index];
        debug!(
            "found existing resource directory in {} section: {:#x?}",
            section.name().unwrap_or_else(|| "?".to_string()),
            section
        );
        if section.virtual_address != virtual_address
            || section.size_of_raw_data == 0
            || (section.pointer_to_raw_data as u64) < first_section_start
        {
            debug!("resource directory does not own its section, keeping section intact");
            return None;
        }
        for (directory, data) in self.header_data_directory.iter() {
            // the certificate table holds a file offset rather than an address
            if *directory != ResourceTable
                && *directory != CertificateTable
                && data.size > 0
                && section.contains_rva(data.virtual_address)
            {
                info!("resource section also used by data directory {:?}", directory);
                warn!("resource section used by multiple data directories can indicate a packed executable");
                return None;
            }
        }
        let last_virtual_end = self.section_table.iter().map(SectionHeader::virtual_end).max();
        let is_last = section.raw_end() == last_section_end
            && Some(section.virtual_end()) == last_virtual_end;
        let capacity = section.size_of_raw_data;
        if new_size <= capacity || is_last {
            Some(index)
        } else {
            debug!(
                "existing resource section is too small and followed by other sections ({:#x?} < {:#x?})",
                capacity, new_size
            );
            None
        }
    }

    /// Returns the current resource directory or `None` if the image does not contain a resource directory.
    pub fn resource_directory(&self) -> Option<&ResourceDirectory> {
        self.resource_directory.as_ref()
    }

    /// Returns the raw image data with all changes applied.
    pub fn data(&self) -> &[u8] { &self.image }

    /// Returns the parsed coff header.
    pub fn coff_header(&self) -> &CoffHeader { &self.coff_header }

    /// Returns the parsed windows header.
    pub fn windows_header(&self) -> &GenericWindowsHeader { &self.windows_header }

    /// Returns the data directory for the requested header.
    pub fn data_directory(&self, directory: DataDirectoryType) -> Option<&ImageDataDirectory> {
        self.header_data_directory.get(&directory)
    }

    /// Returns the section header containing the data directory.
    pub fn section_header_for_data_directory(
        &self, directory: DataDirectoryType,
    ) -> Option<&SectionHeader> {
        let data_directory = self.data_directory(directory)?;
        let virtual_address = data_directory.virtual_address;
        self.section_table.iter().find(|section| section.contains_rva(virtual_address))
    }

    /// Returns all section tables existing in the image.
    pub fn section_table(&self) -> &[SectionHeader] { &self.section_table }
}
