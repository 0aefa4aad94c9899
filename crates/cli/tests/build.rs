use fae_loader::fixture::ElfFixture;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const CRT0_BLOB: [u8; 8] = [0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7];

/// Fresh working directory holding `crt0/crt0.fae` and the given ELF.
fn workspace(prefix: &str, fixture: &ElfFixture, elf_name: &str) -> (PathBuf, PathBuf) {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("fae-tests-{}-{}", prefix, nonce));
    std::fs::create_dir_all(dir.join("crt0")).unwrap();
    std::fs::write(dir.join("crt0").join("crt0.fae"), CRT0_BLOB).unwrap();

    let elf = dir.join(elf_name);
    fixture.write_to(&elf).expect("Failed to write ELF fixture");
    (dir, elf)
}

fn run_build(dir: &Path, extra: &[&str], elf: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_build-fae"))
        .arg("--crt0-path")
        .arg(dir.join("crt0"))
        .args(extra)
        .arg(elf)
        .output()
        .expect("Failed to execute build-fae")
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_build-fae"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("FAE image builder"));
    assert!(stdout.contains("--crt0-path"));
}

#[test]
fn test_cli_builds_image_and_gdbinit() {
    let (dir, elf) = workspace("build", &ElfFixture::post_issuance_app(), "app.elf");

    let output = run_build(&dir, &[], &elf);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let image = std::fs::read(dir.join("app.fae")).unwrap();
    // crt0 (8) + symbols (24) + relocations (4 + 8) + partition (0x28) = 84 -> 96
    assert_eq!(image.len(), 96);
    assert_eq!(&image[..8], &CRT0_BLOB);
    assert_eq!(&image[8..12], &[0x1, 0, 0, 0]);
    assert_eq!(&image[12..16], &[0x10, 0, 0, 0]);
    assert_eq!(&image[28..32], &[0x28, 0, 0, 0]);
    assert_eq!(&image[32..36], &[2, 0, 0, 0]);
    assert_eq!(&image[36..40], &[0x20, 0, 0, 0]);
    assert_eq!(&image[40..44], &[0x24, 0, 0, 0]);
    assert_eq!(image[44], 0x10);
    assert_eq!(&image[60..76], &[0u8; 16]);
    assert_eq!(image[76], 0xD0);
    assert!(image[84..].iter().all(|b| *b == 0xFF));

    let gdbinit = std::fs::read_to_string(dir.join("gdbinit")).unwrap();
    assert!(gdbinit.contains("set $text = $crt0_text + 44\n"));
    assert!(gdbinit.contains("crt0.elf -s .text $crt0_text"));
    assert!(gdbinit.contains("app.elf -s .rom $text"));
    // 44 + 0x10 + 0x4 + 0x8
    assert!(gdbinit.contains("set $flash_end = $flash_base + 72\n"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_report_and_layout() {
    let (dir, elf) = workspace("report", &ElfFixture::post_issuance_app(), "app.elf");

    let layout = dir.join("layout.yaml");
    std::fs::write(&layout, "alignment: 64\npadding_value: 0\n").unwrap();
    let report = dir.join("report.json");

    let output = run_build(
        &dir,
        &[
            "--layout",
            layout.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
            "--no-gdbinit",
        ],
        &elf,
    );
    assert!(output.status.success());
    assert!(!dir.join("gdbinit").exists());

    let image = std::fs::read(dir.join("app.fae")).unwrap();
    assert_eq!(image.len(), 128);
    assert!(image[84..].iter().all(|b| *b == 0x00));

    let content = std::fs::read_to_string(&report).unwrap();
    let result: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(result["total_size"], 128);
    assert_eq!(result["metadata_size"], 44);
    assert_eq!(result["partition_size"], 0x28);
    assert_eq!(result["padding_size"], 44);
    assert_eq!(result["image_sha256"].as_str().unwrap().len(), 64);
    assert!(result["output"].as_str().unwrap().ends_with("app.fae"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_rejects_bad_elf_name() {
    let (dir, elf) = workspace("badname", &ElfFixture::post_issuance_app(), "app.debug.elf");

    let output = run_build(&dir, &[], &elf);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("name.elf"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_missing_symtab_fails() {
    let fixture = ElfFixture {
        symtab: false,
        ..ElfFixture::post_issuance_app()
    };
    let (dir, elf) = workspace("nosymtab", &fixture, "app.elf");

    let output = run_build(&dir, &[], &elf);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(".symtab"));
    assert!(!dir.join("app.fae").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_missing_crt0_fails() {
    let (dir, elf) = workspace("nocrt0", &ElfFixture::post_issuance_app(), "app.elf");
    std::fs::remove_file(dir.join("crt0").join("crt0.fae")).unwrap();

    let output = run_build(&dir, &[], &elf);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("crt0"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_unsupported_relocation_type_fails() {
    let mut fixture = ElfFixture::post_issuance_app();
    if let Some(rel) = fixture.relocations.as_mut() {
        rel.entries.push((0x26, 3));
    }
    let (dir, elf) = workspace("reltype", &fixture, "app.elf");

    let output = run_build(&dir, &[], &elf);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("entry 2"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_cli_make_crt0_without_makefile_fails() {
    let (dir, elf) = workspace("make", &ElfFixture::post_issuance_app(), "app.elf");

    let output = run_build(&dir, &["--make-crt0"], &elf);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("make"), "stderr: {}", stderr);
    assert!(!dir.join("app.fae").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
