//! End to end tests of the packaging stage

use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use bundlegen::bundlegen_package::widget::{CERTIFICATE_NAME, SIGNER_NAME};
use bundlegen::metadata::{PlatformConfig, embedded_metadata_path, load_app_metadata};
use bundlegen::tool_configuration::Configuration;
use bundlegen::{BundleFormat, BundleRequest, create_bundle};
use flate2::read::GzDecoder;
use serial_test::serial;

fn unpacked_bundle(base: &Path) -> std::path::PathBuf {
    let bundle = base.join("com.rdk.wayland-egl-test");
    fs::create_dir_all(bundle.join("rootfs/usr/bin")).unwrap();
    fs::write(bundle.join("config.json"), r#"{"ociVersion": "1.0.2-dev"}"#).unwrap();
    fs::write(bundle.join("rootfs/usr/bin/wayland-egl-test"), "elf").unwrap();
    fs::write(
        embedded_metadata_path(&bundle),
        r#"{"id": "com.rdk.wayland-egl-test", "version": "1.0.0", "description": "EGL test", "priority": "optional", "graphics": true}"#,
    )
    .unwrap();
    bundle
}

fn request(bundle: &Path, format: BundleFormat) -> BundleRequest {
    let platform: PlatformConfig =
        serde_json::from_str(r#"{"arch": {"arch": "arm", "variant": "v7"}}"#).unwrap();
    BundleRequest {
        bundle_dir: bundle.to_path_buf(),
        output: bundle.to_path_buf(),
        format,
        app_metadata: load_app_metadata(bundle, None).unwrap(),
        platform,
    }
}

fn member_names<R: Read>(reader: R) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().display().to_string())
        .collect()
}

#[test]
fn test_tarball_bundle_with_ownership() {
    let work = tempfile::tempdir().unwrap();
    let bundle = unpacked_bundle(work.path());
    let config: Configuration = "[ownership]\nuid = 0\ngid = 0\nmode_mask = \"750\"\n"
        .parse()
        .unwrap();

    let output = create_bundle(&config, &request(&bundle, BundleFormat::TarGz)).unwrap();
    assert_eq!(output, work.path().join("com.rdk.wayland-egl-test.tar.gz"));

    let mut archive = tar::Archive::new(GzDecoder::new(fs::File::open(&output).unwrap()));
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let entry = entry.unwrap();
        assert_eq!(entry.header().uid().unwrap(), 0);
        assert_eq!(entry.header().gid().unwrap(), 0);
        assert_eq!(entry.header().mode().unwrap() & 0o027, 0);
        names.push(entry.path().unwrap().display().to_string());
    }

    assert!(names.contains(&"config.json".to_string()));
    assert!(names.contains(&"rootfs/usr/bin/wayland-egl-test".to_string()));
    // the metadata was consumed before packaging
    assert!(!names.iter().any(|n| n.ends_with("appmetadata.json")));
}

#[test]
fn test_ipk_bundle() {
    let work = tempfile::tempdir().unwrap();
    let temp_root = tempfile::tempdir().unwrap();
    let bundle = unpacked_bundle(work.path());
    let config = Configuration {
        temp_root: temp_root.path().to_path_buf(),
        ..Configuration::default()
    };

    let output = create_bundle(&config, &request(&bundle, BundleFormat::Ipk)).unwrap();
    assert_eq!(output, work.path().join("com.rdk.wayland-egl-test.ipk"));

    let mut outer = tar::Archive::new(GzDecoder::new(fs::File::open(&output).unwrap()));
    let mut control = Vec::new();
    let mut names = Vec::new();
    for entry in outer.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = entry.path().unwrap().display().to_string();
        if name == "control.tar.gz" {
            entry.read_to_end(&mut control).unwrap();
        }
        names.push(name);
    }
    assert_eq!(names, ["data.tar.gz", "control.tar.gz", "debian-binary"]);
    assert_eq!(member_names(control.as_slice()), ["control"]);

    let mut control_archive = tar::Archive::new(GzDecoder::new(control.as_slice()));
    let mut text = String::new();
    control_archive
        .entries()
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    assert_eq!(
        text,
        "Package: com.rdk.wayland-egl-test\n\
         Version: 1.0.0\n\
         Architecture: armv7\n\
         Description: EGL test\n\
         Priority: optional\n\
         Depends: \n"
    );

    // no intermediates are left behind
    assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
    let mut siblings: Vec<String> = fs::read_dir(work.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    siblings.sort();
    assert_eq!(
        siblings,
        ["com.rdk.wayland-egl-test", "com.rdk.wayland-egl-test.ipk"]
    );
}

#[test]
#[serial]
fn test_widget_bundle() {
    let work = tempfile::tempdir().unwrap();
    let temp_root = tempfile::tempdir().unwrap();
    let resources = tempfile::tempdir().unwrap();
    let bundle = unpacked_bundle(work.path());

    fs::write(resources.path().join("config.xml"), "<widget/>").unwrap();
    fs::write(resources.path().join("icon.png"), "png").unwrap();
    fs::write(resources.path().join(CERTIFICATE_NAME), "cert").unwrap();
    let signer = resources.path().join(SIGNER_NAME);
    fs::write(&signer, "#!/bin/sh\ncp \"$3\" \"$7\"\n").unwrap();
    fs::set_permissions(&signer, fs::Permissions::from_mode(0o755)).unwrap();

    let config: Configuration = format!(
        "temp_root = {:?}\n[widget]\nresources_dir = {:?}\n",
        temp_root.path(),
        resources.path()
    )
    .parse()
    .unwrap();

    let output = create_bundle(&config, &request(&bundle, BundleFormat::Widget)).unwrap();
    assert_eq!(output, work.path().join("com.rdk.wayland-egl-test.wgt"));

    let archive = zip::ZipArchive::new(fs::File::open(&output).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"config.xml"));
    assert!(names.contains(&"icon.png"));
    assert!(names.contains(&"rootfs/usr/bin/wayland-egl-test"));

    assert_eq!(fs::read_dir(temp_root.path()).unwrap().count(), 0);
}
