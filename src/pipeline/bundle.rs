// src/pipeline/bundle.rs

//! ES-module bundler producing a single UMD file.
//!
//! Each module is parsed with oxc and becomes a function in a small
//! registry. Top-level `import` and `export` statements are replaced in place
//! by registry calls; everything else is copied verbatim. Replacements never
//! change a module's line count, so every body line maps one-to-one to its
//! source line.
//!
//! Only relative specifiers (`./`, `../`) are bundled. Import bindings are
//! snapshots taken when the import statement runs; exports are live getters.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Declaration, ExportAllDeclaration,
    ExportDefaultDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration,
    ImportDeclaration, ImportDeclarationSpecifier, Statement,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};
use thiserror::Error;

use crate::fs::FileSystem;
use crate::pipeline::source::normalize;
use crate::pipeline::sourcemap::InlineSourceMap;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct BundleError {
    /// Module the problem was found in.
    pub path: PathBuf,
    pub message: String,
}

impl BundleError {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

type BundleResult<T> = std::result::Result<T, BundleError>;

/// A finished bundle.
#[derive(Debug)]
pub struct Bundle {
    pub code: String,
    /// Present when requested; maps bundle lines to module lines.
    pub source_map: Option<InlineSourceMap>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportBinding {
    /// `exported` reads a binding of this module.
    Local { exported: String, local: String },
    /// `exported` reads `imported` from another module's exports.
    Reexport {
        exported: String,
        module_var: String,
        imported: String,
    },
    /// Every named export of another module.
    Star { module_var: String },
}

#[derive(Debug)]
struct Module {
    path: PathBuf,
    /// Display name used in the source map.
    name: String,
    source: String,
    body: String,
    exports: Vec<ExportBinding>,
}

/// Bundle `entry` and everything it imports.
///
/// `root` is used to give modules short names in the source map.
pub fn bundle(
    fs: &dyn FileSystem,
    entry: &Path,
    root: &Path,
    global_name: &str,
    with_source_map: bool,
    bundle_name: &str,
) -> BundleResult<Bundle> {
    let modules = collect_modules(fs, entry, root)?;
    Ok(emit(&modules, global_name, with_source_map, bundle_name))
}

fn collect_modules(fs: &dyn FileSystem, entry: &Path, root: &Path) -> BundleResult<Vec<Module>> {
    let entry = normalize(entry);
    let mut ids: HashMap<PathBuf, usize> = HashMap::new();
    let mut modules: Vec<Option<Module>> = Vec::new();
    let mut queue: VecDeque<(usize, PathBuf)> = VecDeque::new();

    ids.insert(entry.clone(), 0);
    modules.push(None);
    queue.push_back((0, entry));

    while let Some((id, path)) = queue.pop_front() {
        let source = fs
            .read_to_string(&path)
            .map_err(|e| BundleError::new(&path, format!("{e:#}")))?;

        let mut resolve = |spec: &str| -> BundleResult<usize> {
            let target = resolve_specifier(fs, &path, spec)?;
            if let Some(&known) = ids.get(&target) {
                return Ok(known);
            }
            let next = modules.len();
            ids.insert(target.clone(), next);
            modules.push(None);
            queue.push_back((next, target));
            Ok(next)
        };

        let (body, exports) = rewrite_module(&path, &source, &mut resolve)?;

        let name = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        modules[id] = Some(Module {
            path,
            name,
            source,
            body,
            exports,
        });
    }

    Ok(modules.into_iter().flatten().collect())
}

fn resolve_specifier(fs: &dyn FileSystem, from: &Path, spec: &str) -> BundleResult<PathBuf> {
    if !(spec.starts_with("./") || spec.starts_with("../")) {
        return Err(BundleError::new(
            from,
            format!("cannot bundle bare import '{spec}'; only relative imports are supported"),
        ));
    }

    let base = from.parent().unwrap_or_else(|| Path::new(""));
    let joined = normalize(&base.join(spec));

    let mut with_ext = joined.clone().into_os_string();
    with_ext.push(".js");

    let candidates = [joined.clone(), PathBuf::from(with_ext), joined.join("index.js")];
    candidates
        .into_iter()
        .find(|c| fs.is_file(c))
        .ok_or_else(|| BundleError::new(from, format!("cannot resolve import '{spec}'")))
}

/// Collects the statement replacements and export bindings of one module.
struct Rewriter<'s, 'r> {
    path: &'s Path,
    source: &'s str,
    resolve: &'r mut dyn FnMut(&str) -> BundleResult<usize>,
    edits: Vec<(Span, String)>,
    exports: Vec<ExportBinding>,
}

/// Rewrite one module's top-level import/export statements.
fn rewrite_module(
    path: &Path,
    source: &str,
    resolve: &mut dyn FnMut(&str) -> BundleResult<usize>,
) -> BundleResult<(String, Vec<ExportBinding>)> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if let Some(err) = parsed.errors.first() {
        return Err(BundleError::new(path, format!("syntax error: {err}")));
    }
    if parsed.panicked {
        return Err(BundleError::new(path, "syntax error"));
    }

    let mut rewriter = Rewriter {
        path,
        source,
        resolve,
        edits: Vec::new(),
        exports: Vec::new(),
    };

    for stmt in parsed.program.body.iter() {
        match stmt {
            Statement::ImportDeclaration(decl) => rewriter.import(decl)?,
            Statement::ExportAllDeclaration(decl) => rewriter.export_all(decl)?,
            Statement::ExportNamedDeclaration(decl) => rewriter.export_named(decl)?,
            Statement::ExportDefaultDeclaration(decl) => rewriter.export_default(decl),
            _ => {}
        }
    }

    Ok((splice(source, &rewriter.edits), rewriter.exports))
}

impl Rewriter<'_, '_> {
    fn text(&self, start: u32, end: u32) -> &str {
        &self.source[start as usize..end as usize]
    }

    fn line_of(&self, offset: u32) -> usize {
        self.source[..offset as usize].matches('\n').count() + 1
    }

    fn require(&mut self, spec: &str) -> BundleResult<(usize, String)> {
        let id = (self.resolve)(spec)?;
        Ok((id, module_var(id)))
    }

    fn import(&mut self, decl: &ImportDeclaration<'_>) -> BundleResult<()> {
        let (id, module_var) = self.require(decl.source.value.as_str())?;

        let Some(specifiers) = &decl.specifiers else {
            self.edits.push((decl.span, format!("__require({id});")));
            return Ok(());
        };

        let mut line = format!("var {module_var} = __require({id})");
        for specifier in specifiers.iter() {
            let (local, value) = match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    (&s.local.name, member(&module_var, s.imported.name().as_str()))
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    (&s.local.name, member(&module_var, "default"))
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    (&s.local.name, module_var.clone())
                }
            };
            line.push_str(&format!(", {local} = {value}"));
        }
        line.push(';');

        self.edits.push((decl.span, line));
        Ok(())
    }

    fn export_all(&mut self, decl: &ExportAllDeclaration<'_>) -> BundleResult<()> {
        let (id, module_var) = self.require(decl.source.value.as_str())?;

        let binding = match &decl.exported {
            Some(name) => ExportBinding::Local {
                exported: name.name().to_string(),
                local: module_var.clone(),
            },
            None => ExportBinding::Star {
                module_var: module_var.clone(),
            },
        };
        self.exports.push(binding);
        self.edits
            .push((decl.span, format!("var {module_var} = __require({id});")));
        Ok(())
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration<'_>) -> BundleResult<()> {
        if let Some(source) = &decl.source {
            let (id, module_var) = self.require(source.value.as_str())?;
            for spec in decl.specifiers.iter() {
                self.exports.push(ExportBinding::Reexport {
                    exported: spec.exported.name().to_string(),
                    module_var: module_var.clone(),
                    imported: spec.local.name().to_string(),
                });
            }
            self.edits
                .push((decl.span, format!("var {module_var} = __require({id});")));
            return Ok(());
        }

        let Some(declaration) = &decl.declaration else {
            for spec in decl.specifiers.iter() {
                self.exports.push(ExportBinding::Local {
                    exported: spec.exported.name().to_string(),
                    local: spec.local.name().to_string(),
                });
            }
            self.edits.push((decl.span, String::new()));
            return Ok(());
        };

        let mut names = Vec::new();
        match declaration {
            Declaration::VariableDeclaration(var) => {
                for declarator in var.declarations.iter() {
                    bound_names(&declarator.id, &mut names);
                }
            }
            Declaration::FunctionDeclaration(func) => {
                names.extend(func.id.as_ref().map(|id| id.name.to_string()));
            }
            Declaration::ClassDeclaration(class) => {
                names.extend(class.id.as_ref().map(|id| id.name.to_string()));
            }
            _ => {
                return Err(BundleError::new(
                    self.path,
                    format!(
                        "unsupported export declaration on line {}",
                        self.line_of(decl.span.start)
                    ),
                ));
            }
        }

        for name in names {
            self.exports.push(ExportBinding::Local {
                exported: name.clone(),
                local: name,
            });
        }
        let kept = self.text(declaration.span().start, decl.span.end).to_string();
        self.edits.push((decl.span, kept));
        Ok(())
    }

    fn export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => func.id.as_ref(),
            ExportDefaultDeclarationKind::ClassDeclaration(class) => class.id.as_ref(),
            _ => None,
        };
        let body = self
            .text(decl.declaration.span().start, decl.span.end)
            .to_string();

        let (local, replacement) = match named {
            Some(id) => (id.name.to_string(), body),
            None => {
                let terminator = if body.trim_end().ends_with(';') { "" } else { ";" };
                (
                    "__default".to_string(),
                    format!("var __default = {body}{terminator}"),
                )
            }
        };

        self.exports.push(ExportBinding::Local {
            exported: "default".to_string(),
            local,
        });
        self.edits.push((decl.span, replacement));
    }
}

/// Every identifier a declarator binds, destructuring included.
fn bound_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in object.properties.iter() {
                bound_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                bound_names(element, names);
            }
            if let Some(rest) = &array.rest {
                bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => bound_names(&assign.left, names),
    }
}

/// Apply non-overlapping, ordered `edits`. Each replacement is padded with
/// the newlines the replaced text spanned.
fn splice(source: &str, edits: &[(Span, String)]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;

    for (span, replacement) in edits {
        let (start, end) = (span.start as usize, span.end as usize);
        out.push_str(&source[last..start]);

        let missing = source[start..end]
            .matches('\n')
            .count()
            .saturating_sub(replacement.matches('\n').count());
        out.push_str(replacement);
        out.push_str(&"\n".repeat(missing));

        last = end;
    }

    out.push_str(&source[last..]);
    out
}

fn module_var(id: usize) -> String {
    format!("__m{id}")
}

/// `object.name`, or `object["name"]` when `name` is not an identifier.
fn member(object: &str, name: &str) -> String {
    let mut chars = name.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');

    if is_identifier {
        format!("{object}.{name}")
    } else {
        format!("{object}[{name:?}]")
    }
}

const PRELUDE: &str = r#"  'use strict';

  var __modules = {};
  var __cache = {};

  function __require(id) {
    var cached = __cache[id];
    if (cached) return cached;
    var exports = __cache[id] = {};
    __modules[id](exports);
    return exports;
  }

  function __export(target, name, get) {
    Object.defineProperty(target, name, { enumerable: true, get: get });
  }

  function __exportStar(target, source) {
    Object.keys(source).forEach(function (key) {
      if (key !== 'default' && !Object.prototype.hasOwnProperty.call(target, key)) {
        __export(target, key, function () { return source[key]; });
      }
    });
  }
"#;

/// Lines of generated code plus the source map under construction.
struct Emitter {
    lines: Vec<String>,
    map: Option<InlineSourceMap>,
}

impl Emitter {
    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn push_mapped(&mut self, line: &str, source: Option<u32>, source_line: usize) {
        if let (Some(map), Some(source)) = (self.map.as_mut(), source) {
            map.map_line(self.lines.len(), source, source_line);
        }
        self.lines.push(line.to_string());
    }
}

fn emit(modules: &[Module], global_name: &str, with_source_map: bool, bundle_name: &str) -> Bundle {
    let mut e = Emitter {
        lines: Vec::new(),
        map: with_source_map.then(|| InlineSourceMap::new(bundle_name)),
    };

    e.push("(function (global, factory) {");
    e.push("  typeof exports === 'object' && typeof module !== 'undefined' ? module.exports = factory() :");
    e.push("  typeof define === 'function' && define.amd ? define(factory) :");
    e.push(format!(
        "  (global = typeof globalThis !== 'undefined' ? globalThis : global || self, global.{global_name} = factory());"
    ));
    e.push("})(this, (function () {");
    for line in PRELUDE.lines() {
        e.push(line);
    }

    for (id, module) in modules.iter().enumerate() {
        let source = e
            .map
            .as_mut()
            .map(|m| m.add_source(&module.name, &module.source));

        e.push("");
        e.push(format!("  // {}", module.name));
        e.push(format!("  __modules[{id}] = function (__exports) {{"));

        for binding in module.exports.iter() {
            match binding {
                ExportBinding::Local { exported, local } => e.push(format!(
                    "  __export(__exports, {exported:?}, function () {{ return {local}; }});"
                )),
                ExportBinding::Reexport {
                    exported,
                    module_var,
                    imported,
                } => e.push(format!(
                    "  __export(__exports, {exported:?}, function () {{ return {}; }});",
                    member(module_var, imported)
                )),
                ExportBinding::Star { .. } => {}
            }
        }

        for (line_no, line) in module.body.lines().enumerate() {
            e.push_mapped(line, source, line_no);
        }

        for binding in module.exports.iter() {
            if let ExportBinding::Star { module_var } = binding {
                e.push(format!("  __exportStar(__exports, {module_var});"));
            }
        }
        e.push("  };");
    }

    e.push("");
    e.push("  return __require(0);");
    e.push("}));");

    let mut code = e.lines.join("\n");
    code.push('\n');

    tracing::debug!(
        modules = modules.len(),
        first = ?modules.first().map(|m| &m.path),
        "bundled script modules"
    );

    Bundle {
        code,
        source_map: e.map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn bundle_of(files: &[(&str, &str)]) -> BundleResult<Bundle> {
        let fs = MockFileSystem::new();
        for (path, body) in files {
            fs.add_file(format!("/s/scripts/{path}"), *body);
        }
        bundle(
            &fs,
            Path::new("/s/scripts/index.js"),
            Path::new("/s"),
            "app",
            true,
            "app.js",
        )
    }

    fn rewrite(source: &str) -> (String, Vec<ExportBinding>) {
        rewrite_module(
            Path::new("/s/scripts/index.js"),
            source,
            &mut |_: &str| -> BundleResult<usize> { Ok(1) },
        )
        .unwrap()
    }

    fn local(exported: &str, local: &str) -> ExportBinding {
        ExportBinding::Local {
            exported: exported.to_string(),
            local: local.to_string(),
        }
    }

    #[test]
    fn rewrites_imports_and_exports() {
        let out = bundle_of(&[
            (
                "index.js",
                "import greet, { shout as loud } from './greet.js';\nexport const answer = loud(greet('x'));\n",
            ),
            (
                "greet.js",
                "export default function greet(n) {\n  return 'hi ' + n;\n}\nexport function shout(s) { return s.toUpperCase(); }\n",
            ),
        ])
        .unwrap();

        let code = &out.code;
        assert!(code.contains("global.app = factory()"));
        assert!(code.contains("var __m1 = __require(1), greet = __m1.default, loud = __m1.shout;"));
        assert!(code.contains("const answer = loud(greet('x'));"));
        assert!(code.contains(r#"__export(__exports, "answer", function () { return answer; });"#));
        assert!(code.contains(r#"__export(__exports, "default", function () { return greet; });"#));
        assert!(code.contains("function greet(n) {"));
        assert!(!code.contains("export "));
        assert!(!code.contains("import "));
    }

    #[test]
    fn multi_line_import_keeps_line_count() {
        let source = "import {\n  a,\n  b\n} from './lib';\nconsole.log(a, b);\n";
        let (body, _) = rewrite(source);

        assert_eq!(body.lines().count(), source.lines().count());
        assert_eq!(body.lines().nth(4), Some("console.log(a, b);"));
    }

    #[test]
    fn every_declarator_of_an_export_is_exported() {
        let (body, exports) = rewrite("export const a = 1, b = 2;\nexport let [c, { d, e: f }, ...g] = [];\n");

        assert_eq!(
            exports,
            vec![
                local("a", "a"),
                local("b", "b"),
                local("c", "c"),
                local("d", "d"),
                local("f", "f"),
                local("g", "g"),
            ]
        );
        assert!(body.starts_with("const a = 1, b = 2;\nlet [c, { d, e: f }, ...g] = [];"));
    }

    #[test]
    fn multi_declarator_export_reaches_importers() {
        let out = bundle_of(&[
            ("index.js", "import { a, b } from './lib.js';\nconsole.log(a + b);\n"),
            ("lib.js", "export const a = 1, b = 2;\n"),
        ])
        .unwrap();

        assert!(out.code.contains("var __m1 = __require(1), a = __m1.a, b = __m1.b;"));
        assert!(out.code.contains(r#"__export(__exports, "a", function () { return a; });"#));
        assert!(out.code.contains(r#"__export(__exports, "b", function () { return b; });"#));
    }

    #[test]
    fn import_syntax_in_comments_and_strings_is_left_alone() {
        let source = "/*\nimport x from 'docs-example';\n*/\n// import y from 'other';\nconst doc = `\nimport z from 'third';\n`;\nexport { doc };\n";
        let out = bundle_of(&[("index.js", source)]).unwrap();

        assert!(out.code.contains("import x from 'docs-example';"));
        assert!(out.code.contains("// import y from 'other';"));
        assert!(out.code.contains("import z from 'third';"));
        assert!(!out.code.contains("__require(1)"));
        assert!(out.code.contains(r#"__export(__exports, "doc", function () { return doc; });"#));
    }

    #[test]
    fn export_list_and_declarations_combine() {
        let out = bundle_of(&[
            ("index.js", "export * from './lib';\n"),
            ("lib.js", "const a = 1, b = 2;\nexport { a, b as bee };\n"),
        ])
        .unwrap();

        assert!(out.code.contains(r#"__export(__exports, "a", function () { return a; });"#));
        assert!(out.code.contains(r#"__export(__exports, "bee", function () { return b; });"#));
        assert!(out.code.contains("__exportStar(__exports, __m1);"));
    }

    #[test]
    fn reexports_read_through_the_source_module() {
        let out = bundle_of(&[
            ("index.js", "export { shout as loud, default } from './lib.js';\nexport * as lib from './lib.js';\n"),
            ("lib.js", "export default 1;\nexport function shout() {}\n"),
        ])
        .unwrap();

        assert!(out.code.contains(r#"__export(__exports, "loud", function () { return __m1.shout; });"#));
        assert!(out.code.contains(r#"__export(__exports, "default", function () { return __m1.default; });"#));
        assert!(out.code.contains(r#"__export(__exports, "lib", function () { return __m1; });"#));
        assert_eq!(out.code.matches("// scripts/lib.js").count(), 1);
    }

    #[test]
    fn resolves_extensionless_and_index_imports() {
        let out = bundle_of(&[
            ("index.js", "import './util';\nimport * as widgets from './widgets';\n"),
            ("util.js", "window.x = 1;\n"),
            ("widgets/index.js", "export * from './button.js';\n"),
            ("widgets/button.js", "export const Button = 1;\n"),
        ])
        .unwrap();

        assert!(out.code.contains("// scripts/widgets/index.js"));
        assert!(out.code.contains("// scripts/widgets/button.js"));
        assert!(out.code.contains("__require(1);"));
        assert!(out.code.contains("var __m2 = __require(2), widgets = __m2;"));
        assert!(out.code.contains("__exportStar(__exports, __m3);"));
    }

    #[test]
    fn shared_dependency_is_bundled_once() {
        let out = bundle_of(&[
            ("index.js", "import './a.js';\nimport './b.js';\n"),
            ("a.js", "import './shared.js';\n"),
            ("b.js", "import './shared.js';\n"),
            ("shared.js", "window.shared = true;\n"),
        ])
        .unwrap();

        assert_eq!(out.code.matches("// scripts/shared.js").count(), 1);
    }

    #[test]
    fn import_cycles_terminate() {
        let out = bundle_of(&[
            ("index.js", "import { b } from './b.js';\nexport const a = 1;\n"),
            ("b.js", "import { a } from './index.js';\nexport const b = 2;\n"),
        ])
        .unwrap();
        assert!(out.code.contains("var __m0 = __require(0), a = __m0.a;"));
    }

    #[test]
    fn bare_imports_are_rejected() {
        let err = bundle_of(&[("index.js", "import React from 'react';\n")]).unwrap_err();
        assert!(err.message.contains("bare import 'react'"));
        assert_eq!(err.path, Path::new("/s/scripts/index.js"));
    }

    #[test]
    fn unresolvable_import_names_the_importer() {
        let err = bundle_of(&[
            ("index.js", "import './a.js';\n"),
            ("a.js", "import './missing.js';\n"),
        ])
        .unwrap_err();
        assert_eq!(err.path, Path::new("/s/scripts/a.js"));
    }

    #[test]
    fn syntax_errors_name_the_module() {
        let err = bundle_of(&[
            ("index.js", "import './broken.js';\n"),
            ("broken.js", "export const = ;\n"),
        ])
        .unwrap_err();

        assert_eq!(err.path, Path::new("/s/scripts/broken.js"));
        assert!(err.message.starts_with("syntax error"), "{}", err.message);
    }

    #[test]
    fn anonymous_default_exports() {
        let (body, exports) = rewrite("export default function () {\n  return 1;\n}\n");
        assert!(body.starts_with("var __default = function () {\n  return 1;\n};"));
        assert_eq!(exports, vec![local("default", "__default")]);

        let (body, _) = rewrite("export default { size: 2 };\n");
        assert!(body.starts_with("var __default = { size: 2 };"));
    }

    #[test]
    fn body_lines_map_to_source_lines() {
        let out = bundle_of(&[("index.js", "const a = 1;\nconst b = 2;\n")]).unwrap();
        let map = out.source_map.unwrap().into_source_map();

        let first = out
            .code
            .lines()
            .position(|l| l == "const a = 1;")
            .unwrap() as u32;
        let mapped: Vec<(u32, u32)> = map
            .tokens()
            .map(|t| (t.get_dst_line(), t.get_src_line()))
            .collect();

        assert_eq!(mapped, vec![(first, 0), (first + 1, 1)]);
    }

    #[test]
    fn non_identifier_names_use_bracket_access() {
        assert_eq!(member("__m1", "shout"), "__m1.shout");
        assert_eq!(member("__m1", "$el_2"), "__m1.$el_2");
        assert_eq!(member("__m1", "kebab-name"), r#"__m1["kebab-name"]"#);
    }
}
