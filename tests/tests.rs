use resutil::{constants::*, *};
use std::{collections::HashSet, fs, path::PathBuf, sync::Once};
use tempfile::TempDir;

static INIT_LOGGER: Once = Once::new();
fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .format_timestamp(None)
            .format_module_path(false)
            .format_level(true)
            .format_target(false)
            .write_style(env_logger::WriteStyle::Auto)
            .init();
    });
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Minimal PE32+ image with a single `.text` section and `directories` data directory entries.
fn minimal_image(directories: u32) -> Vec<u8> {
    let mut data = vec![0u8; 0x200];
    data[0..2].copy_from_slice(b"MZ");
    put_u32(&mut data, 0x3c, 0x40);
    data[0x40..0x44].copy_from_slice(b"PE\0\0");

    // coff header
    let optional_header_size = 112 + directories * 8;
    put_u16(&mut data, 0x44, 0x8664);
    put_u16(&mut data, 0x46, 1);
    put_u16(&mut data, 0x54, optional_header_size as u16);
    put_u16(&mut data, 0x56, 0x22);

    // optional header
    put_u16(&mut data, 0x58, 0x20b);
    put_u64(&mut data, 0x70, 0x140000000);
    put_u32(&mut data, 0x78, 0x1000);
    put_u32(&mut data, 0x7c, 0x200);
    put_u32(&mut data, 0x90, 0x2000);
    put_u32(&mut data, 0x94, 0x200);
    put_u16(&mut data, 0x9c, 3);
    put_u32(&mut data, 0xc4, directories);

    // section table
    let section = 0x58 + optional_header_size as usize;
    data[section..section + 8].copy_from_slice(b".text\0\0\0");
    put_u32(&mut data, section + 8, 0x200);
    put_u32(&mut data, section + 12, 0x1000);
    put_u32(&mut data, section + 16, 0x200);
    put_u32(&mut data, section + 20, 0x200);
    put_u32(&mut data, section + 36, 0x60000020);

    data.resize(0x400, 0xcc);
    data
}

/// [`minimal_image`] with a `.rsrc` section in which both resource types share one name table.
fn image_with_shared_table() -> Vec<u8> {
    let mut data = minimal_image(16);
    put_u16(&mut data, 0x46, 2);
    put_u32(&mut data, 0x90, 0x3000);
    put_u32(&mut data, 0xd8, 0x2000);
    put_u32(&mut data, 0xdc, 0x64);

    let section = 0x170;
    data[section..section + 8].copy_from_slice(b".rsrc\0\0\0");
    put_u32(&mut data, section + 8, 0x64);
    put_u32(&mut data, section + 12, 0x2000);
    put_u32(&mut data, section + 16, 0x200);
    put_u32(&mut data, section + 20, 0x400);
    put_u32(&mut data, section + 36, 0x40000040);

    let mut rsrc = vec![0u8; 0x200];
    // type table
    put_u16(&mut rsrc, 0x0e, 2);
    put_u32(&mut rsrc, 0x10, RT_CURSOR as u32);
    put_u32(&mut rsrc, 0x14, 0x80000020);
    put_u32(&mut rsrc, 0x18, RT_BITMAP as u32);
    put_u32(&mut rsrc, 0x1c, 0x80000020);
    // name table
    put_u16(&mut rsrc, 0x2e, 1);
    put_u32(&mut rsrc, 0x30, 1);
    put_u32(&mut rsrc, 0x34, 0x80000038);
    // language table
    put_u16(&mut rsrc, 0x46, 1);
    put_u32(&mut rsrc, 0x48, LANGUAGE_ID_NEUTRAL as u32);
    put_u32(&mut rsrc, 0x4c, 0x50);
    // data entry
    put_u32(&mut rsrc, 0x50, 0x2060);
    put_u32(&mut rsrc, 0x54, 4);
    rsrc[0x60..0x64].copy_from_slice(b"DATA");

    data.extend_from_slice(&rsrc);
    data
}

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

fn fixture(name: &str, data: &[u8]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();
    Fixture { _dir: dir, path }
}

fn rcdata() -> ResourceType { ResourceType::resolve("rcdata") }

#[test]
fn parse_minimal_image() {
    init_logger();

    let data = minimal_image(16);
    let image = Image::parse(&data[..]).unwrap();
    assert_eq!(image.section_table().len(), 1);
    assert_eq!(image.section_table()[0].name().as_deref(), Some(".text"));
    assert!(image.resource_directory().is_none());
    assert_eq!(image.windows_header().size_of_image(), 0x2000);
}

#[test]
fn reject_invalid_image() {
    init_logger();

    assert!(Image::parse(&b"not an executable"[..]).is_err());

    let mut data = minimal_image(16);
    data[0x40] = b'X';
    assert!(matches!(Image::parse(&data[..]), Err(ImageReadError::InvalidHeader(_))));

    let truncated = &minimal_image(16)[..0x100];
    assert!(Image::parse(truncated).is_err());
}

#[test]
fn write_and_read_resource_lengths() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();

    let lengths = [1usize, 7, 8, 9, 4096];
    for (index, length) in lengths.iter().enumerate() {
        let data = (0..*length).map(|value| (value % 251) as u8).collect::<Vec<_>>();
        let id = ResourceId::Numeric(index as u16 + 1);
        editor.write(&data, &fixture.path, &rcdata(), &id).unwrap();
        assert_eq!(editor.read(&fixture.path, &rcdata(), &id).unwrap(), data);
    }
    for (index, length) in lengths.iter().enumerate() {
        let id = ResourceId::Numeric(index as u16 + 1);
        assert_eq!(editor.read(&fixture.path, &rcdata(), &id).unwrap().len(), *length);
    }
}

#[test]
fn write_empty_data() {
    init_logger();

    let original = minimal_image(16);
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();

    let result = editor.write(&[], &fixture.path, &rcdata(), &ResourceId::Numeric(1));
    assert!(matches!(result, Err(ResourceError::InvalidData)));
    assert_eq!(fs::read(&fixture.path).unwrap(), original);
}

#[test]
fn replace_resource() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();
    let id = ResourceId::parse("CONFIG").unwrap();

    editor.write(b"first version of the data", &fixture.path, &rcdata(), &id).unwrap();
    editor.write(b"second", &fixture.path, &rcdata(), &id).unwrap();
    assert_eq!(editor.read(&fixture.path, &rcdata(), &id).unwrap(), b"second");

    // named lookups ignore ascii case
    let lower = ResourceId::parse("config").unwrap();
    assert_eq!(editor.read(&fixture.path, &rcdata(), &lower).unwrap(), b"second");

    let ids = editor.enumerate_ids(&fixture.path, &rcdata()).unwrap().collect::<Vec<_>>();
    assert_eq!(ids, ["CONFIG"]);
}

#[test]
fn rebuilt_image_layout() {
    init_logger();

    let mut original = minimal_image(16);
    original.extend_from_slice(b"OVERLAY");
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();

    editor.write(b"manifest", &fixture.path, &ResourceType::resolve("manifest"), &ResourceId::Numeric(1)).unwrap();
    let data = fs::read(&fixture.path).unwrap();
    assert!(data.ends_with(b"OVERLAY"));
    assert_eq!(&data[0x200..0x400], &original[0x200..0x400]);

    let image = Image::parse(&data[..]).unwrap();
    assert_eq!(image.section_table().len(), 2);
    let section = image.section_header_for_data_directory(DataDirectoryType::ResourceTable).unwrap();
    assert_eq!(section.name().as_deref(), Some(".rsrc"));
    let (virtual_address, pointer) = (section.virtual_address, section.pointer_to_raw_data);
    assert_eq!(virtual_address, 0x2000);
    assert_eq!(pointer, 0x400);
    assert_eq!(image.windows_header().size_of_image(), 0x3000);

    let directory = image.resource_directory().unwrap();
    assert_eq!(directory.virtual_address(), 0x2000);
    assert_eq!(directory.root().len(), 1);
    let resource = directory
        .get(&ResourceEntryName::ID(RT_MANIFEST as u32), &ResourceEntryName::ID(1), LANGUAGE_ID_NEUTRAL)
        .unwrap();
    assert_eq!(resource.data(), b"manifest");

    // the resource section is the last section and is rebuilt in place
    editor.write(&[7u8; 0x900], &fixture.path, &rcdata(), &ResourceId::Numeric(2)).unwrap();
    let data = fs::read(&fixture.path).unwrap();
    assert!(data.ends_with(b"OVERLAY"));
    let image = Image::parse(&data[..]).unwrap();
    assert_eq!(image.section_table().len(), 2);
    assert_eq!(image.windows_header().size_of_image(), 0x3000);
    assert!(!image.resource_directory().unwrap().root().is_empty());
    assert_eq!(image.resource_directory().unwrap().root().len(), 2);
    assert_eq!(editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(2)).unwrap(), [7u8; 0x900]);
}

#[test]
fn add_missing_data_directories() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(2));
    let editor = ResourceEditor::new();

    editor.write(b"data", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();
    let image = Image::parse_file(&fixture.path).unwrap();
    assert_eq!(image.windows_header().number_of_rva_and_sizes(), 3);
    let size_of_optional_header = image.coff_header().size_of_optional_header;
    assert_eq!(size_of_optional_header, 112 + 3 * 8);
    assert_eq!(image.section_table()[0].name().as_deref(), Some(".text"));
    assert_eq!(editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap(), b"data");
}

#[test]
fn relocate_certificate_table() {
    init_logger();

    let mut original = minimal_image(16);
    put_u32(&mut original, 0xe8, 0x400);
    put_u32(&mut original, 0xec, 8);
    original.extend_from_slice(b"CERTDATA");
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();

    let certificate = |data: &[u8]| {
        let image = Image::parse(data).unwrap();
        let entry = *image.data_directory(DataDirectoryType::CertificateTable).unwrap();
        (entry.virtual_address as usize, entry.size as usize)
    };

    // a new resource section is inserted before the certificate
    editor.write(b"x", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();
    let data = fs::read(&fixture.path).unwrap();
    let (offset, size) = certificate(&data);
    assert_eq!((offset, size), (0x600, 8));
    assert_eq!(&data[offset..offset + size], b"CERTDATA");

    // growing the last section in place moves it again
    editor.write(&[1u8; 0x300], &fixture.path, &rcdata(), &ResourceId::Numeric(2)).unwrap();
    let data = fs::read(&fixture.path).unwrap();
    let (offset, size) = certificate(&data);
    assert_eq!(offset, 0x800);
    assert_eq!(&data[offset..offset + size], b"CERTDATA");
    assert_eq!(Image::parse(&data[..]).unwrap().section_table().len(), 2);
    assert_eq!(editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap(), b"x");
}

#[test]
fn failed_commit_keeps_file() {
    init_logger();

    // the first section starts right after the section table, leaving no room for another section header
    let mut original = minimal_image(16);
    put_u32(&mut original, 0x148 + 20, 0x170);
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();

    let error = editor.write(b"data", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::CommitFailed);
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_INVALID_DATA));
    assert_eq!(fs::read(&fixture.path).unwrap(), original);

    let files = fs::read_dir(fixture.path.parent().unwrap()).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn skip_shared_resource_tables() {
    init_logger();

    let fixture = fixture("app.exe", &image_with_shared_table());
    let image = Image::parse_file(&fixture.path).unwrap();
    assert_eq!(image.resource_directory().unwrap().root().len(), 1);

    let editor = ResourceEditor::new();
    let cursor = ResourceType::resolve("cursor");
    assert_eq!(editor.enumerate_types(&fixture.path).unwrap().collect::<Vec<_>>(), ["cursor"]);
    assert_eq!(editor.read(&fixture.path, &cursor, &ResourceId::Numeric(1)).unwrap(), b"DATA");

    editor.write(b"more", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();
    assert_eq!(editor.enumerate_types(&fixture.path).unwrap().collect::<Vec<_>>(), ["cursor", "rcdata"]);
    assert_eq!(editor.read(&fixture.path, &cursor, &ResourceId::Numeric(1)).unwrap(), b"DATA");
}

#[test]
fn copy_resource() {
    init_logger();

    let source = fixture("source.exe", &minimal_image(16));
    let target = fixture("target.dll", &minimal_image(16));
    let editor = ResourceEditor::new();
    let version = ResourceType::resolve("version");

    editor.write(b"version info", &source.path, &version, &ResourceId::Numeric(1)).unwrap();
    editor.copy(&source.path, &version, &ResourceId::Numeric(1), &target.path, &ResourceId::Numeric(5)).unwrap();
    assert_eq!(editor.read(&target.path, &version, &ResourceId::Numeric(5)).unwrap(), b"version info");

    let error = editor
        .copy(&source.path, &version, &ResourceId::Numeric(2), &target.path, &ResourceId::Numeric(6))
        .unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::ResourceNotFound);
}

#[test]
fn enumerate_types() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();
    for name in ["bitmap", "version", "manifest"] {
        editor.write(name.as_bytes(), &fixture.path, &ResourceType::resolve(name), &ResourceId::Numeric(1)).unwrap();
    }

    let types = editor.enumerate_types(&fixture.path).unwrap().collect::<HashSet<_>>();
    let expected = ["bitmap", "version", "manifest"].iter().map(|name| name.to_string()).collect::<HashSet<_>>();
    assert_eq!(types, expected);
}

#[test]
fn enumerate_custom_types() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();

    let quoted = ResourceType::resolve("\"icon\"");
    assert_eq!(quoted, ResourceType::Custom("icon".to_string()));
    editor.write(b"not an icon", &fixture.path, &quoted, &ResourceId::Numeric(1)).unwrap();
    editor.write(b"payload", &fixture.path, &ResourceType::resolve("PAYLOAD"), &ResourceId::Numeric(1)).unwrap();

    let types = editor.enumerate_types(&fixture.path).unwrap().collect::<Vec<_>>();
    assert_eq!(types, ["\"icon\"", "\"PAYLOAD\""]);
    for name in &types {
        let resource_type = ResourceType::resolve(name);
        assert!(!resource_type.is_known());
        assert!(editor.read(&fixture.path, &resource_type, &ResourceId::Numeric(1)).is_ok());
    }
    assert!(editor.read(&fixture.path, &ResourceType::resolve("icon"), &ResourceId::Numeric(1)).is_err());
}

#[test]
fn enumerate_ids() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();
    for id in ["2", "NAMED", "1"] {
        editor.write(b"data", &fixture.path, &rcdata(), &ResourceId::parse(id).unwrap()).unwrap();
    }

    let ids = editor.enumerate_ids(&fixture.path, &rcdata()).unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids.collect::<Vec<_>>(), ["NAMED", "1", "2"]);

    let mut empty = editor.enumerate_ids(&fixture.path, &ResourceType::resolve("bitmap")).unwrap();
    assert!(empty.next().is_none());
}

#[test]
fn enumerate_languages() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();
    editor.write(b"data", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();

    let languages = editor.enumerate_languages(&fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();
    assert_eq!(languages, [LANGUAGE_ID_NEUTRAL]);

    let error = editor.enumerate_languages(&fixture.path, &rcdata(), &ResourceId::Numeric(2)).unwrap_err();
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_RESOURCE_NAME_NOT_FOUND));
}

#[test]
fn read_missing_resource() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();

    let error = editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::ResourceNotFound);
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_RESOURCE_DATA_NOT_FOUND));

    editor.write(b"data", &fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap();
    let bogus = ResourceType::resolve("bogus");
    let error = editor.read(&fixture.path, &bogus, &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::ResourceNotFound);
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_RESOURCE_TYPE_NOT_FOUND));

    let error = editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(9)).unwrap_err();
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_RESOURCE_NAME_NOT_FOUND));
}

#[test]
fn open_invalid_files() {
    init_logger();

    let dir = tempfile::tempdir().unwrap();
    let editor = ResourceEditor::new();

    let missing = dir.path().join("missing.exe");
    let error = editor.read(&missing, &rcdata(), &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::FileOpen);
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_FILE_NOT_FOUND));

    let text = dir.path().join("text.exe");
    fs::write(&text, b"plain text, no executable").unwrap();
    let error = editor.write(b"data", &text, &rcdata(), &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::FileOpen);
    assert_eq!(error.platform_error().map(|e| e.code), Some(ERROR_BAD_EXE_FORMAT));
    assert_eq!(fs::read(&text).unwrap(), b"plain text, no executable");
}

#[test]
fn reject_missing_arguments() {
    init_logger();

    let fixture = fixture("app.exe", &minimal_image(16));
    let editor = ResourceEditor::new();

    let error = editor.write(b"data", &fixture.path, &ResourceType::resolve("\"\""), &ResourceId::Numeric(1)).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::ArgumentNull);
    let error = editor.read(&fixture.path, &rcdata(), &ResourceId::parse("").unwrap()).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::ArgumentNull);
    let error = editor.enumerate_types("").unwrap_err();
    assert!(error.is_argument_error());
}

#[test]
fn reject_zero_id() {
    init_logger();

    let original = minimal_image(16);
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();
    let zero = ResourceId::parse("0").unwrap();

    let error = editor.write(b"data", &fixture.path, &rcdata(), &zero).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::InvalidArguments);
    assert!(error.is_argument_error());
    let error = editor.read(&fixture.path, &rcdata(), &zero).unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::InvalidArguments);
    assert_eq!(fs::read(&fixture.path).unwrap(), original);
}

#[test]
fn transaction_commit_and_discard() {
    init_logger();

    let original = minimal_image(16);
    let fixture = fixture("app.exe", &original);
    let editor = ResourceEditor::new();

    {
        let mut transaction = editor.begin(&fixture.path).unwrap();
        transaction.submit(&rcdata(), &ResourceId::Numeric(1), b"discarded").unwrap();
    }
    assert_eq!(fs::read(&fixture.path).unwrap(), original);

    let mut transaction = editor.begin(&fixture.path).unwrap();
    assert_eq!(transaction.path(), fixture.path.as_path());
    assert!(matches!(
        transaction.submit(&rcdata(), &ResourceId::Numeric(1), &[]),
        Err(ResourceError::InvalidData)
    ));
    transaction.submit(&rcdata(), &ResourceId::Numeric(1), b"one").unwrap();
    transaction.submit(&ResourceType::resolve("html"), &ResourceId::parse("INDEX").unwrap(), b"<html>").unwrap();
    transaction.commit().unwrap();

    assert_eq!(editor.read(&fixture.path, &rcdata(), &ResourceId::Numeric(1)).unwrap(), b"one");
    assert_eq!(
        editor.read(&fixture.path, &ResourceType::resolve("html"), &ResourceId::parse("INDEX").unwrap()).unwrap(),
        b"<html>"
    );
}

#[test]
fn resolve_resource_types() {
    assert_eq!(ResourceType::resolve("icon"), ResourceType::Known(KnownType::Icon));
    assert_eq!(ResourceType::resolve("icon").code(), Some(RT_ICON));
    assert_eq!(ResourceType::resolve("ICON"), ResourceType::Custom("ICON".to_string()));
    assert_eq!(ResourceType::resolve("\"version\""), ResourceType::Custom("version".to_string()));
    assert_eq!(ResourceType::resolve("\""), ResourceType::Custom("\"".to_string()));
    assert_eq!("manifest".parse::<ResourceType>().unwrap().code(), Some(24));

    for (name, code) in known_types() {
        let resource_type = ResourceType::resolve(name);
        assert_eq!(resource_type.code(), Some(code));
        assert_eq!(resource_type.name(), name);
        assert_eq!(ResourceType::from_code(code), resource_type);
    }

    let custom = ResourceType::Custom("bitmap".to_string());
    assert_eq!(custom.to_string(), "\"bitmap\"");
    assert_eq!(ResourceType::resolve(&custom.name()), custom);

    let unknown = ResourceType::from_code(300);
    assert_eq!(unknown, ResourceType::Numeric(300));
    assert_eq!(unknown.name(), UNKNOWN_TYPE_NAME);
    assert!(known_types().all(|(name, _)| name != UNKNOWN_TYPE_NAME));
}

#[test]
fn known_type_table() {
    let names = known_types().map(|(name, _)| name).collect::<Vec<_>>();
    assert_eq!(names.len(), 21);
    assert!(names.windows(2).all(|pair| pair[0] < pair[1]));

    let codes = known_types().map(|(_, code)| code).collect::<HashSet<_>>();
    assert_eq!(codes.len(), 21);
    assert_eq!(KnownType::from_name("groupicon").map(KnownType::code), Some(RT_GROUP_ICON));
    assert_eq!(KnownType::from_code(RT_VXD).map(KnownType::name), Some("vxd"));
    assert_eq!(KnownType::from_code(13), None);
}

#[test]
fn parse_resource_ids() {
    assert_eq!(ResourceId::parse("123").unwrap(), ResourceId::Numeric(123));
    assert_eq!(ResourceId::parse("0").unwrap(), ResourceId::Numeric(0));
    assert_eq!(ResourceId::parse("65535").unwrap(), ResourceId::Numeric(65535));
    assert_eq!(ResourceId::parse("12a").unwrap(), ResourceId::Named("12a".to_string()));
    assert_eq!(ResourceId::parse("-1").unwrap(), ResourceId::Named("-1".to_string()));
    assert_eq!(ResourceId::parse("\"7\"").unwrap(), ResourceId::Named("\"7\"".to_string()));
    assert_eq!(ResourceId::parse("").unwrap(), ResourceId::Named(String::new()));

    let error = ResourceId::parse("65536").unwrap_err();
    assert_eq!(error.kind(), ResourceErrorKind::InvalidArguments);
    assert!(error.is_argument_error());
    assert!("99999999999999999999".parse::<ResourceId>().is_err());

    assert_eq!(ResourceId::Numeric(42).to_string(), "42");
    assert_eq!(ResourceId::from(7u16).number(), Some(7));
}
