//! Windows API and binary constants.

#![allow(non_upper_case_globals)]

pub type DWORD = u32;
pub type WORD = u16;
pub type LANGID = WORD;


// https://learn.microsoft.com/en-us/windows/win32/intl/language-identifier-constants-and-strings

pub const LANG_NEUTRAL: WORD = 0x00;
pub const SUBLANG_NEUTRAL: WORD = 0x00;
/// Language tag used for every resource written by this crate.
pub const LANGUAGE_ID_NEUTRAL: LANGID = make_lang_id(LANG_NEUTRAL, SUBLANG_NEUTRAL);
pub const LANGUAGE_ID_EN_US: LANGID = 1033; // 0x0409, en-US

pub const fn make_lang_id(primary: WORD, sub: WORD) -> LANGID { (sub << 10) | primary }

/// Resource data submitted for writing is zero-padded to a multiple of this many bytes.
pub const RESOURCE_DATA_ALIGNMENT: usize = 8;


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format

pub const PE_DOS_MAGIC: WORD = 0x5a4d; // MZ
pub const PE_PTR_OFFSET: DWORD = 0x03c;
pub const PE_NT_SIGNATURE: DWORD = 0x00004550; // PE00
pub const PE_32_MAGIC: WORD = 0x010b;
pub const PE_64_MAGIC: WORD = 0x020b;


// https://docs.microsoft.com/en-us/windows/win32/menurc/resource-types

pub const RT_CURSOR: WORD = 0x01;
pub const RT_BITMAP: WORD = 0x02;
pub const RT_ICON: WORD = 0x03;
pub const RT_MENU: WORD = 0x04;
pub const RT_DIALOG: WORD = 0x05;
pub const RT_STRING: WORD = 0x06;
pub const RT_FONTDIR: WORD = 0x07;
pub const RT_FONT: WORD = 0x08;
pub const RT_ACCELERATOR: WORD = 0x09;
pub const RT_RCDATA: WORD = 0x0A;
pub const RT_MESSAGETABLE: WORD = 0x0B;
pub const RT_GROUP_CURSOR: WORD = 0x0C;
pub const RT_GROUP_ICON: WORD = 0x0E;
pub const RT_VERSION: WORD = 0x10;
pub const RT_DLGINCLUDE: WORD = 0x11;
pub const RT_PLUGPLAY: WORD = 0x13;
pub const RT_VXD: WORD = 0x14;
pub const RT_ANICURSOR: WORD = 0x15;
pub const RT_ANIICON: WORD = 0x16;
pub const RT_HTML: WORD = 0x17;
pub const RT_MANIFEST: WORD = 0x18;


// https://docs.microsoft.com/en-us/windows/win32/debug/pe-format#section-flags

pub const IMAGE_SCN_CNT_INITIALIZED_DATA: DWORD = 0x00000040;
pub const IMAGE_SCN_MEM_READ: DWORD = 0x40000000;


// https://learn.microsoft.com/en-us/windows/win32/debug/system-error-codes

pub const ERROR_FILE_NOT_FOUND: DWORD = 2;
pub const ERROR_INVALID_DATA: DWORD = 13;
pub const ERROR_BAD_ARGUMENTS: DWORD = 160;
pub const ERROR_BAD_EXE_FORMAT: DWORD = 193;
pub const ERROR_RESOURCE_DATA_NOT_FOUND: DWORD = 1812;
pub const ERROR_RESOURCE_TYPE_NOT_FOUND: DWORD = 1813;
pub const ERROR_RESOURCE_NAME_NOT_FOUND: DWORD = 1814;
pub const ERROR_RESOURCE_LANG_NOT_FOUND: DWORD = 1815;
