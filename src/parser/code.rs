// Compiled code scanner over dex files and smali disassembly
//
// Both inputs are decoded into smali classes; the scan walks their typed
// instructions and keeps only what can point at a resource.

use super::{CodeScan, FieldRef};
use smali::dex::error::DexError;
use smali::dex::DexFile;
use smali::smali_ops::{DexOp, MethodRef};
use smali::types::{ArrayDataElement, SmaliClass, SmaliError, SmaliOp};

/// Scan every class of a dex file
pub fn scan_dex(bytes: &[u8]) -> Result<CodeScan, DexError> {
    let classes = DexFile::from_bytes(bytes)?.to_smali()?;
    let mut scan = CodeScan::default();
    for class in &classes {
        scan.merge(scan_class(class));
    }
    Ok(scan)
}

/// Scan one smali source file
pub fn scan_smali(contents: &str) -> Result<CodeScan, SmaliError> {
    let class = SmaliClass::from_smali(contents)?;
    Ok(scan_class(&class))
}

/// Collect constants, static field accesses and interesting calls of one class.
/// Generated `R` classes hold every ID as a field initializer and are skipped.
pub fn scan_class(class: &SmaliClass) -> CodeScan {
    let mut scan = CodeScan::default();
    if is_resource_class(&class.name.as_java_type()) {
        return scan;
    }

    for method in &class.methods {
        for op in &method.ops {
            match op {
                SmaliOp::Op(op) => scan_op(op, &mut scan),
                SmaliOp::ArrayData(data) => {
                    for element in &data.elements {
                        if let ArrayDataElement::Int(value) = element {
                            scan.int_constants.push(*value as u32);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    scan
}

fn scan_op(op: &DexOp, scan: &mut CodeScan) {
    match op {
        DexOp::Const4 { value, .. } => scan.int_constants.push(*value as i32 as u32),
        DexOp::Const16 { value, .. } => scan.int_constants.push(*value as i32 as u32),
        DexOp::Const { value, .. } => scan.int_constants.push(*value as u32),
        DexOp::ConstHigh16 { value, .. } => {
            scan.int_constants.push(((*value as i32) << 16) as u32)
        }
        DexOp::ConstString { value, .. } | DexOp::ConstStringJumbo { value, .. } => {
            scan.string_constants.push(value.clone())
        }
        DexOp::SGet { field, .. }
        | DexOp::SGetWide { field, .. }
        | DexOp::SGetObject { field, .. }
        | DexOp::SGetBoolean { field, .. }
        | DexOp::SGetByte { field, .. }
        | DexOp::SGetChar { field, .. }
        | DexOp::SGetShort { field, .. }
        | DexOp::SPut { field, .. }
        | DexOp::SPutWide { field, .. }
        | DexOp::SPutObject { field, .. }
        | DexOp::SPutBoolean { field, .. }
        | DexOp::SPutByte { field, .. }
        | DexOp::SPutChar { field, .. }
        | DexOp::SPutShort { field, .. } => scan.field_refs.push(FieldRef {
            class: descriptor_to_class_name(&field.class),
            name: field.name.clone(),
        }),
        DexOp::InvokeVirtual { method, .. }
        | DexOp::InvokeSuper { method, .. }
        | DexOp::InvokeInterface { method, .. }
        | DexOp::InvokeDirect { method, .. }
        | DexOp::InvokeStatic { method, .. }
        | DexOp::InvokeVirtualRange { method, .. }
        | DexOp::InvokeSuperRange { method, .. }
        | DexOp::InvokeInterfaceRange { method, .. }
        | DexOp::InvokeDirectRange { method, .. }
        | DexOp::InvokeStaticRange { method, .. } => record_invoke(method, scan),
        _ => {}
    }
}

fn record_invoke(method: &MethodRef, scan: &mut CodeScan) {
    scan.record_call(&descriptor_to_class_name(&method.class), &method.name);
}

/// `Lcom/example/R$layout;` -> `com.example.R$layout`
pub fn descriptor_to_class_name(descriptor: &str) -> String {
    match descriptor.strip_prefix('L').and_then(|d| d.strip_suffix(';')) {
        Some(internal) => internal.replace('/', "."),
        None => descriptor.to_string(),
    }
}

/// Whether a dotted class name is a generated `R` class or one of its nested type classes
pub fn is_resource_class(class_name: &str) -> bool {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);
    simple == "R" || simple.starts_with("R$")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DexBuilder;

    const MAIN_ACTIVITY: &str = r#".class public Lcom/example/MainActivity;
.super Landroid/app/Activity;

.method protected onCreate(Landroid/os/Bundle;)V
    .locals 5
    const/high16 v0, 0x7f030000
    invoke-virtual {p0, v0}, Lcom/example/MainActivity;->setContentView(I)V
    sget v1, Lcom/example/R$string;->app_name:I
    const-string v2, "drawable/\"quoted\"A"
    invoke-virtual {v0, v2, v1, v1}, Landroid/content/res/Resources;->getIdentifier(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)I
    const/4 v1, -0x1
    return-void
.end method

.method static constant()V
    .locals 1
    fill-array-data v0, :array_0
    return-void

    :array_0
    .array-data 4
        0x7f010000
        0x7f010001
    .end array-data
.end method
"#;

    #[test]
    fn test_scan_smali_method_bodies() {
        let scan = scan_smali(MAIN_ACTIVITY).unwrap();
        assert_eq!(
            scan.int_constants,
            vec![0x7f030000, 0xffff_ffff, 0x7f010000, 0x7f010001]
        );
        assert_eq!(scan.string_constants, vec!["drawable/\"quoted\"A".to_string()]);
        assert_eq!(
            scan.field_refs,
            vec![FieldRef {
                class: "com.example.R$string".to_string(),
                name: "app_name".to_string()
            }]
        );
        assert!(scan.calls_get_identifier);
        assert!(!scan.loads_web_content);
    }

    #[test]
    fn test_resource_class_is_skipped() {
        let scan = scan_smali(
            r#".class public final Lcom/example/R$layout;
.super Ljava/lang/Object;

.field public static final main:I = 0x7f030000

.method static constant()V
    .locals 1
    const v0, 0x7f030000
    return-void
.end method
"#,
        )
        .unwrap();
        assert!(scan.int_constants.is_empty());
    }

    #[test]
    fn test_web_view_range_call() {
        let scan = scan_smali(
            r#".class public LWeb;
.super Ljava/lang/Object;

.method static show(Landroid/webkit/WebView;Ljava/lang/String;)V
    .locals 2
    invoke-virtual/range {p0 .. p1}, Landroid/webkit/WebView;->loadUrl(Ljava/lang/String;)V
    return-void
.end method
"#,
        )
        .unwrap();
        assert!(scan.loads_web_content);
        assert!(!scan.calls_get_identifier);
    }

    #[test]
    fn test_scan_dex_instructions() {
        let dex = DexBuilder::new()
            .class("Lcom/example/MainActivity;")
            .const_int(0x7f030000)
            .const_high16(0x7f07)
            .sget("Lcom/example/R$drawable;", "icon")
            .const_string("ic_%d")
            .invoke("Landroid/content/res/Resources;", "getIdentifier")
            .array_data(&[0x7f010000, 0x7f010001])
            .class("Lcom/example/R$layout;")
            .const_int(0x7f0a0000)
            .build();

        let scan = scan_dex(&dex).unwrap();
        assert_eq!(
            scan.int_constants,
            vec![0x7f030000, 0x7f070000, 0x7f010000, 0x7f010001]
        );
        assert_eq!(scan.string_constants, vec!["ic_%d".to_string()]);
        assert_eq!(
            scan.field_refs,
            vec![FieldRef {
                class: "com.example.R$drawable".to_string(),
                name: "icon".to_string()
            }]
        );
        assert!(scan.calls_get_identifier);
    }

    #[test]
    fn test_dex_web_view_call() {
        let dex = DexBuilder::new()
            .class("Lcom/example/Web;")
            .invoke("Landroid/webkit/WebView;", "loadDataWithBaseURL")
            .build();
        assert!(scan_dex(&dex).unwrap().loads_web_content);
    }

    #[test]
    fn test_malformed_dex_is_rejected() {
        assert!(scan_dex(b"garbage").is_err());
        let mut truncated = DexBuilder::new().class("LA;").const_int(1).build();
        truncated[0] = b'x';
        assert!(scan_dex(&truncated).is_err());
    }

    #[test]
    fn test_descriptor_names() {
        assert_eq!(descriptor_to_class_name("Lcom/example/R$string;"), "com.example.R$string");
        assert_eq!(descriptor_to_class_name("I"), "I");
        assert!(is_resource_class("com.example.R"));
        assert!(is_resource_class("com.example.R$id"));
        assert!(!is_resource_class("com.example.Rx"));
    }
}
