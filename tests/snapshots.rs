use apisurface::{load_module_from_str, ApiWriter, CSharpRenderer, MarkdownRenderer};
use insta::Settings;

/// Configure insta settings for consistent snapshot behavior
pub fn configure_insta() -> Settings {
    let mut settings = Settings::clone_current();
    settings.set_prepend_module_to_snapshot(false);
    settings.set_omit_expression(true);
    settings.set_snapshot_suffix("snap");
    settings
}

const COUNTER_MODULE: &str = r#"{
  "name": "Demo.Snap",
  "types": [
    {
      "namespace": "Demo.Snap",
      "name": "Counter",
      "kind": "class",
      "accessibility": "public",
      "base_type": { "primitive": "object" },
      "fields": [
        { "name": "Count", "accessibility": "public", "type": { "primitive": "int32" } }
      ],
      "methods": [
        {
          "name": "Increment",
          "accessibility": "public",
          "parameters": [
            { "name": "step", "type": { "primitive": "int32" }, "flags": "OPTIONAL", "default_value": { "int32": 1 } }
          ]
        }
      ]
    }
  ]
}"#;

#[test]
fn snapshot_csharp_surface() {
    let module = load_module_from_str(COUNTER_MODULE).expect("valid module model");
    let output = ApiWriter::new(CSharpRenderer::new()).render_to_string(&module);

    configure_insta().bind(|| {
        insta::assert_snapshot!(output, @r#"
namespace Demo.Snap
{
    public class Counter
    {
        public int Count;
        public void Increment(int step = 1) { }
    }
}
"#);
    });
}

#[test]
fn snapshot_markdown_surface() {
    let module = load_module_from_str(COUNTER_MODULE).expect("valid module model");
    let output = ApiWriter::new(MarkdownRenderer::new()).render_to_string(&module);

    configure_insta().bind(|| {
        insta::assert_snapshot!(output, @r#"
# Demo.Snap

## Demo.Snap

```csharp
namespace Demo.Snap
{
    public class Counter
    {
        public int Count;
        public void Increment(int step = 1) { }
    }
}
```
"#);
    });
}
