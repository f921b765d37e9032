//! Rendering of wrapper IR into target source text
//!
//! The [`Backend`] trait is the seam between what a wrapper does and how it
//! reads. [`CpythonBackend`] emits C++ against the CPython C API and the
//! image runtime header. Per-kind marshalling lives in one table indexed by
//! [`KindTag`], so adding a kind is a single entry.

use pixgen_schema::KindTag;
use std::fmt::Write as _;

use crate::ir::{
    CallArg, Dispatch, Invocation, Slot, SlotRole, Stmt, WrapperFunction, WrapperModule,
};

pub trait Backend: Send + Sync {
    /// Short name used in logs and `--backend` selection
    fn name(&self) -> &'static str;

    /// Extension of generated source files, without the dot
    fn file_extension(&self) -> &'static str;

    /// Render one module. Output depends only on the input.
    fn render(&self, module: &WrapperModule) -> String;
}

// ============================================================================
// MARSHAL TABLE
// ============================================================================

/// How one kind crosses the boundary.
///
/// Templates substitute `{symbol}`, `{boundary}`, `{name}` and `{function}`.
/// `{fail}` is the error exit, which frees owned conversions first.
#[derive(Debug)]
pub struct Marshal {
    pub tag: KindTag,
    /// Tuple unpacking format character
    pub format: char,
    /// Native local type for inputs; `None` keeps only the boundary object
    pub native: Option<&'static str>,
    /// Native local type when the kind is returned, if different
    pub result_native: Option<&'static str>,
    /// Boundary temporary type; `None` unpacks straight into the native local
    pub boundary: Option<&'static str>,
    pub unmarshal: &'static [&'static str],
    pub marshal: &'static [&'static str],
    /// A returned null pointer means "no value"
    pub nullable: bool,
}

const PYOBJECT: Option<&str> = Some("PyObject*");

const fn direct(tag: KindTag, format: char, native: &'static str, marshal: &'static [&'static str]) -> Marshal {
    Marshal {
        tag,
        format,
        native: Some(native),
        result_native: None,
        boundary: None,
        unmarshal: &[],
        marshal,
        nullable: false,
    }
}

const fn text(tag: KindTag) -> Marshal {
    Marshal {
        tag,
        format: 's',
        native: Some("char*"),
        result_native: Some("std::string"),
        boundary: None,
        unmarshal: &[],
        marshal: &["{boundary} = PyUnicode_FromStringAndSize({symbol}.data(), {symbol}.size());"],
        nullable: false,
    }
}

const fn object(
    tag: KindTag,
    native: &'static str,
    unmarshal: &'static [&'static str],
    marshal: &'static [&'static str],
) -> Marshal {
    Marshal {
        tag,
        format: 'O',
        native: Some(native),
        result_native: None,
        boundary: PYOBJECT,
        unmarshal,
        marshal,
        nullable: native.as_bytes()[native.len() - 1] == b'*',
    }
}

pub static MARSHAL_TABLE: [Marshal; 26] = [
    direct(KindTag::Int, 'i', "int", &["{boundary} = PyLong_FromLong((long){symbol});"]),
    direct(KindTag::Real, 'd', "double", &["{boundary} = PyFloat_FromDouble((double){symbol});"]),
    Marshal {
        tag: KindTag::Complex,
        format: 'D',
        native: Some("ComplexPixel"),
        result_native: None,
        boundary: Some("Py_complex"),
        unmarshal: &["{symbol} = ComplexPixel({boundary}.real, {boundary}.imag);"],
        marshal: &["{boundary} = PyComplex_FromDoubles({symbol}.real(), {symbol}.imag());"],
        nullable: false,
    },
    text(KindTag::Text),
    direct(KindTag::Check, 'i', "int", &["{boundary} = PyBool_FromLong((long){symbol});"]),
    direct(KindTag::Choice, 'i', "int", &["{boundary} = PyLong_FromLong((long){symbol});"]),
    text(KindTag::ChoiceString),
    text(KindTag::FileOpen),
    text(KindTag::FileSave),
    text(KindTag::Directory),
    object(
        KindTag::Image,
        "Image*",
        &[
            "if (!PyObject_TypeCheck({boundary}, image_type)) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be an image\");",
            "  {fail}",
            "}",
            "{symbol} = ((Image*)((RectObject*){boundary})->m_x);",
            "image_get_fv({boundary}, &{symbol}->features, &{symbol}->features_len);",
        ],
        &["{boundary} = create_ImageObject({symbol});"],
    ),
    Marshal {
        tag: KindTag::ImageList,
        format: 'O',
        native: Some("ImageVector"),
        result_native: Some("std::list<Image*>*"),
        boundary: PYOBJECT,
        unmarshal: &[
            "const char* type_error_{name} = \"Argument '{name}' of '{function}' must be an iterable of images\";",
            "PyObject* {boundary}_seq = PySequence_Fast({boundary}, type_error_{name});",
            "if ({boundary}_seq == NULL)",
            "  {fail}",
            "Py_ssize_t {symbol}_size = PySequence_Fast_GET_SIZE({boundary}_seq);",
            "{symbol}.resize({symbol}_size);",
            "for (Py_ssize_t i = 0; i < {symbol}_size; ++i) {",
            "  PyObject* element = PySequence_Fast_GET_ITEM({boundary}_seq, i);",
            "  if (!PyObject_TypeCheck(element, image_type)) {",
            "    PyErr_SetString(PyExc_TypeError, type_error_{name});",
            "    Py_DECREF({boundary}_seq);",
            "    {fail}",
            "  }",
            "  {symbol}[i] = std::pair<Image*, int>((Image*)(((RectObject*)element)->m_x), get_image_combination(element));",
            "  image_get_fv(element, &{symbol}[i].first->features, &{symbol}[i].first->features_len);",
            "}",
            "Py_DECREF({boundary}_seq);",
        ],
        marshal: &["{boundary} = ImageList_to_python({symbol});", "delete {symbol};"],
        nullable: true,
    },
    object(
        KindTag::Class,
        "PyObject*",
        &["{symbol} = {boundary};"],
        &["{boundary} = {symbol};"],
    ),
    object(
        KindTag::Point,
        "Point",
        &[
            "try {",
            "  {symbol} = coerce_Point({boundary});",
            "} catch (const std::invalid_argument&) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a Point, or convertible to a Point\");",
            "  {fail}",
            "}",
        ],
        &["{boundary} = create_PointObject({symbol});"],
    ),
    object(
        KindTag::FloatPoint,
        "FloatPoint",
        &[
            "try {",
            "  {symbol} = coerce_FloatPoint({boundary});",
            "} catch (const std::invalid_argument&) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a FloatPoint, or convertible to a FloatPoint\");",
            "  {fail}",
            "}",
        ],
        &["{boundary} = create_FloatPointObject({symbol});"],
    ),
    Marshal {
        tag: KindTag::Dim,
        format: 'O',
        native: Some("Dim"),
        result_native: Some("Dim*"),
        boundary: PYOBJECT,
        unmarshal: &[
            "if (!is_DimObject({boundary})) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a Dim\");",
            "  {fail}",
            "}",
            "{symbol} = *((Dim*)((DimObject*){boundary})->m_x);",
        ],
        marshal: &["{boundary} = create_DimObject(*{symbol});", "delete {symbol};"],
        nullable: true,
    },
    object(
        KindTag::Rect,
        "Rect*",
        &[
            "if (!is_RectObject({boundary})) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a Rect\");",
            "  {fail}",
            "}",
            "{symbol} = (((RectObject*){boundary})->m_x);",
        ],
        &["{boundary} = create_RectObject(*{symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::Region,
        "Region*",
        &[
            "if (!is_RegionObject({boundary})) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a Region\");",
            "  {fail}",
            "}",
            "{symbol} = (Region*)((RectObject*){boundary})->m_x;",
        ],
        &["{boundary} = create_RegionObject(*{symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::RegionMap,
        "RegionMap*",
        &[
            "if (!is_RegionMapObject({boundary})) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be a RegionMap\");",
            "  {fail}",
            "}",
            "{symbol} = (RegionMap*)((RegionMapObject*){boundary})->m_x;",
        ],
        &["{boundary} = create_RegionMapObject(*{symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::ImageInfo,
        "ImageInfo*",
        &[
            "if (!is_ImageInfoObject({boundary})) {",
            "  PyErr_SetString(PyExc_TypeError, \"Argument '{name}' of '{function}' must be an ImageInfo\");",
            "  {fail}",
            "}",
            "{symbol} = (ImageInfo*)((ImageInfoObject*){boundary})->m_x;",
        ],
        &["{boundary} = create_ImageInfoObject({symbol});"],
    ),
    object(
        KindTag::PointVector,
        "PointVector*",
        &["{symbol} = PointVector_from_python({boundary});", "if ({symbol} == NULL) {fail}"],
        &["{boundary} = PointVector_to_python({symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::IntVector,
        "IntVector*",
        &["{symbol} = IntVector_from_python({boundary});", "if ({symbol} == NULL) {fail}"],
        &["{boundary} = IntVector_to_python({symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::FloatVector,
        "FloatVector*",
        &["{symbol} = FloatVector_from_python({boundary});", "if ({symbol} == NULL) {fail}"],
        &["{boundary} = FloatVector_to_python({symbol});", "delete {symbol};"],
    ),
    object(
        KindTag::ComplexVector,
        "ComplexVector*",
        &["{symbol} = ComplexVector_from_python({boundary});", "if ({symbol} == NULL) {fail}"],
        &["{boundary} = ComplexVector_to_python({symbol});", "delete {symbol};"],
    ),
    // Pixels are converted at the call site with the receiver's pixel type
    Marshal {
        tag: KindTag::Pixel,
        format: 'O',
        native: None,
        result_native: Some("PyObject*"),
        boundary: PYOBJECT,
        unmarshal: &[],
        marshal: &["{boundary} = {symbol};"],
        nullable: true,
    },
    Marshal {
        tag: KindTag::Info,
        format: 'O',
        native: None,
        result_native: None,
        boundary: PYOBJECT,
        unmarshal: &[],
        marshal: &[],
        nullable: false,
    },
];

pub fn marshal(kind: KindTag) -> &'static Marshal {
    &MARSHAL_TABLE[kind as usize]
}

fn fill(template: &str, slot: &Slot, function: &str, fail: &str) -> String {
    template
        .replace("{symbol}", &slot.symbol)
        .replace("{boundary}", &slot.boundary)
        .replace("{name}", &slot.name)
        .replace("{function}", function)
        .replace("{fail}", fail)
}

/// Single statement leaving the wrapper with an error set
fn fail_statement(function: &WrapperFunction) -> String {
    let deletes: Vec<String> = function
        .owned()
        .map(|slot| format!("delete {};", slot.symbol))
        .collect();
    if deletes.is_empty() {
        "return 0;".to_string()
    } else {
        format!("{{ {} return 0; }}", deletes.join(" "))
    }
}

/// Escape text for a C string literal
fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// "value is A" or "values are A, B, and C"
fn acceptable_phrase(names: &[String]) -> String {
    match names {
        [] => "values are none".to_string(),
        [single] => format!("value is {}", single),
        [head @ .., last] => format!("values are {}, and {}", head.join(", "), last),
    }
}

// ============================================================================
// EMITTER
// ============================================================================

#[derive(Default)]
struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn line(&mut self, s: &str) {
        if s.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open_block(&mut self, header: &str) {
        self.line(&format!("{} {{", header));
        self.indent += 1;
    }

    fn close_block(&mut self, trailer: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(&format!("}}{}", trailer));
    }

    fn finish(self) -> String {
        self.out
    }
}

// ============================================================================
// CPYTHON BACKEND
// ============================================================================

/// C++ against the CPython C API
#[derive(Debug, Clone)]
pub struct CpythonBackend {
    /// Runtime header declaring the image object helpers
    pub runtime_header: String,
    /// Importable module that defines the image classes
    pub core_module: String,
    /// Namespaces opened in every generated file
    pub namespaces: Vec<String>,
}

impl Default for CpythonBackend {
    fn default() -> Self {
        CpythonBackend {
            runtime_header: "gameramodule.hpp".to_string(),
            core_module: "gamera.core".to_string(),
            namespaces: vec!["Gamera".to_string(), "Gamera::Python".to_string()],
        }
    }
}

/// Type handles resolved from the core module at import time
const TYPE_HANDLES: [(&str, &str); 4] = [
    ("image_type", "Image"),
    ("subimage_type", "SubImage"),
    ("cc_type", "CC"),
    ("data_type", "ImageData"),
];

impl Backend for CpythonBackend {
    fn name(&self) -> &'static str {
        "cpython"
    }

    fn file_extension(&self) -> &'static str {
        "cpp"
    }

    fn render(&self, module: &WrapperModule) -> String {
        let mut e = Emitter::default();
        match &module.declared_in {
            Some(file) => e.line(&format!("// Generated by pixgen from {}. Do not edit.", file)),
            None => e.line("// Generated by pixgen. Do not edit."),
        }
        e.blank();

        e.line("#include \"Python.h\"");
        e.line("#include <exception>");
        e.line("#include <stdexcept>");
        e.line("#include <string>");
        e.line(&format!("#include \"{}\"", self.runtime_header));
        for header in &module.headers {
            e.line(&format!("#include \"{}\"", header));
        }
        e.blank();

        for namespace in self.namespaces.iter().chain(&module.namespaces) {
            e.line(&format!("using namespace {};", namespace));
        }
        e.blank();

        let init = format!("PyInit_{}", module.native_name);
        e.open_block("extern \"C\"");
        e.line(&format!("PyMODINIT_FUNC {}(void);", init));
        e.close_block("");
        e.blank();

        for (handle, _) in TYPE_HANDLES {
            e.line(&format!("static PyTypeObject* {} = 0;", handle));
        }
        e.blank();

        for function in &module.functions {
            render_function(&mut e, function);
            e.blank();
        }

        let methods = format!("{}_methods", module.native_name);
        e.open_block(&format!("static PyMethodDef {}[] =", methods));
        for function in &module.functions {
            e.line(&format!(
                "{{ \"{}\", {}, METH_VARARGS, NULL }},",
                function.name, function.entry_point
            ));
        }
        e.line("{ NULL, NULL, 0, NULL }");
        e.close_block(";");
        e.blank();

        let definition = format!("{}_module", module.native_name);
        e.open_block(&format!("static struct PyModuleDef {} =", definition));
        e.line("PyModuleDef_HEAD_INIT,");
        e.line(&format!("\"{}\",", module.native_name));
        e.line("NULL,");
        e.line("-1,");
        e.line(&methods);
        e.close_block(";");
        e.blank();

        e.open_block(&format!("PyMODINIT_FUNC {}(void)", init));
        e.line(&format!("PyObject* m = PyModule_Create(&{});", definition));
        e.line("if (m == NULL)");
        e.line("  return NULL;");
        e.line(&format!(
            "PyObject* core = PyImport_ImportModule(\"{}\");",
            c_string(&self.core_module)
        ));
        e.open_block("if (core == NULL)");
        e.line("Py_DECREF(m);");
        e.line("return NULL;");
        e.close_block("");
        for (handle, class) in TYPE_HANDLES {
            e.line(&format!(
                "{} = (PyTypeObject*)PyObject_GetAttrString(core, \"{}\");",
                handle, class
            ));
            e.open_block(&format!("if ({} == 0)", handle));
            e.line(&format!(
                "PyErr_SetString(PyExc_RuntimeError, \"Unable to get {} type from {}.\");",
                class,
                c_string(&self.core_module)
            ));
            e.line("Py_DECREF(core);");
            e.line("Py_DECREF(m);");
            e.line("return NULL;");
            e.close_block("");
        }
        e.line("Py_DECREF(core);");
        e.line("return m;");
        e.close_block("");
        e.finish()
    }
}

fn render_function(e: &mut Emitter, function: &WrapperFunction) {
    e.open_block(&format!(
        "static PyObject* {}(PyObject* self, PyObject* args)",
        function.entry_point
    ));
    for slot in &function.slots {
        let m = marshal(slot.kind);
        let native = match slot.role {
            SlotRole::Result => m.result_native.or(m.native),
            _ => m.native,
        };
        match native {
            // Owned locals start null so every exit may delete them
            Some(native) if slot.owns_conversion() => {
                e.line(&format!("{} {} = NULL;", native, slot.symbol));
            }
            Some(native) => e.line(&format!("{} {};", native, slot.symbol)),
            None => {}
        }
        match slot.role {
            SlotRole::Result => e.line(&format!("PyObject* {};", slot.boundary)),
            _ => {
                if let Some(boundary) = m.boundary {
                    e.line(&format!("{} {};", boundary, slot.boundary));
                }
            }
        }
    }
    let mut writer = BodyWriter {
        e,
        function,
        fail: fail_statement(function),
    };
    for stmt in &function.body {
        writer.stmt(stmt);
    }
    writer.e.close_block("");
}

struct BodyWriter<'e, 'f> {
    e: &'e mut Emitter,
    function: &'f WrapperFunction,
    fail: String,
}

impl BodyWriter<'_, '_> {
    fn emit_template(&mut self, lines: &[&str], slot: &Slot) {
        for line in lines {
            self.e.line(&fill(line, slot, &self.function.name, &self.fail));
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        let function = self.function;
        let slots = &function.slots;
        match stmt {
            Stmt::ParseArgs => self.parse_args(),
            Stmt::Unmarshal(id) => {
                let slot = &slots[*id];
                self.emit_template(marshal(slot.kind).unmarshal, slot);
            }
            Stmt::Guarded(body) => {
                self.e.open_block("try");
                for inner in body {
                    self.stmt(inner);
                }
                self.e.close_block(" catch (std::exception& e) {");
                self.e.indent += 1;
                self.e.line("PyErr_SetString(PyExc_RuntimeError, e.what());");
                let fail = self.fail.clone();
                self.e.line(&fail);
                self.e.close_block("");
            }
            Stmt::Dispatch(dispatch) => self.dispatch(dispatch),
            Stmt::Invoke(call) => self.invoke(call),
            Stmt::Release(id) => {
                let symbol = &slots[*id].symbol;
                self.e.line(&format!("delete {};", symbol));
                self.e.line(&format!("{} = NULL;", symbol));
            }
            Stmt::ReturnResult(id) => {
                let slot = &slots[*id];
                let m = marshal(slot.kind);
                if m.nullable {
                    self.e.open_block(&format!("if ({} == NULL)", slot.symbol));
                    self.e.open_block("if (PyErr_Occurred() == NULL)");
                    self.e.line("Py_INCREF(Py_None);");
                    self.e.line("return Py_None;");
                    self.e.close_block("");
                    self.e.line("return 0;");
                    self.e.close_block("");
                }
                self.emit_template(m.marshal, slot);
                let line = format!("return {};", slot.boundary);
                self.e.line(&line);
            }
            Stmt::ReturnNone => {
                self.e.line("Py_INCREF(Py_None);");
                self.e.line("return Py_None;");
            }
        }
    }

    fn parse_args(&mut self) {
        let function = self.function;
        let inputs: Vec<&Slot> = function.inputs().collect();
        let format: String = inputs.iter().map(|s| marshal(s.kind).format).collect();
        let mut line = format!(
            "if (PyArg_ParseTuple(args, \"{}:{}\"",
            format, function.name
        );
        for slot in &inputs {
            let target = match marshal(slot.kind).boundary {
                Some(_) => &slot.boundary,
                None => &slot.symbol,
            };
            let _ = write!(line, ", &{}", target);
        }
        line.push_str(") <= 0)");
        self.e.line(&line);
        self.e.line("  return 0;");
    }

    fn dispatch(&mut self, dispatch: &Dispatch) {
        let function = self.function;
        let slot = &function.slots[dispatch.slot];
        self.e.open_block(&format!("switch(get_image_combination({}))", slot.boundary));
        for case in &dispatch.cases {
            self.e.line(&format!("case {}:", case.variant.label));
            self.e.indent += 1;
            for stmt in &case.body {
                self.stmt(stmt);
            }
            self.e.line("break;");
            self.e.indent -= 1;
        }
        self.e.line("default:");
        self.e.indent += 1;
        let names: Vec<String> = dispatch.acceptable.iter().map(|t| t.constant_name()).collect();
        self.e.line(&format!(
            "PyErr_Format(PyExc_TypeError, \"The '{}' argument of '{}' can not have pixel type '%s'. Acceptable {}.\", get_pixel_type_name({}));",
            slot.name,
            function.name,
            acceptable_phrase(&names),
            slot.boundary
        ));
        let fail = self.fail.clone();
        self.e.line(&fail);
        self.e.indent -= 1;
        self.e.close_block("");
    }

    fn invoke(&mut self, call: &Invocation) {
        let function = self.function;
        let slots = &function.slots;
        let args: Vec<String> = call
            .args
            .iter()
            .map(|arg| match arg {
                CallArg::Value(id) => {
                    let slot = &slots[*id];
                    match marshal(slot.kind).native {
                        Some(_) => slot.symbol.clone(),
                        None => slot.boundary.clone(),
                    }
                }
                CallArg::ImageView { slot, variant } => {
                    format!("*(({}*){})", variant, slots[*slot].symbol)
                }
                CallArg::Pixel { slot, pixel_type } => format!(
                    "pixel_from_python<{}Pixel>::convert({})",
                    pixel_type.name(),
                    slots[*slot].boundary
                ),
                CallArg::ProgressBar(caption) => {
                    format!("ProgressBar((char *)\"{}\")", c_string(caption))
                }
            })
            .collect();
        let rhs = format!("{}({})", call.function, args.join(", "));
        let line = match call.result {
            Some(id) if call.pixel_result => {
                format!("{} = pixel_to_python({});", slots[id].symbol, rhs)
            }
            Some(id) => format!("{} = {};", slots[id].symbol, rhs),
            None => format!("{};", rhs),
        };
        self.e.line(&line);
    }
}
