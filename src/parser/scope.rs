//! Lexical scopes and the global symbol tables
//!
//! Scopes are kept in an arena and addressed by [`ScopeId`]. Each frame
//! points at the frame it was opened in, so lookup walks outward from the
//! current frame. Leaving a scope only moves the cursor back to the parent:
//! frames stay in the arena until the parse finishes, and their ids double
//! as the scope numbers that make local IR names unique.
//!
//! Function prototypes and struct types live only in the [`GlobalScope`].

use super::ast::{Binding, Identifier, Prototype, PrototypeId};
use super::types::AggregateType;
use crate::errors::CompileError;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Index of a scope frame in the arena
pub type ScopeId = usize;

/// What a name resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(Identifier),
    /// A bare function name
    Function(PrototypeId),
}

/// Function and type tables shared by every scope
#[derive(Debug, Default)]
pub struct GlobalScope {
    prototypes: Vec<Prototype>,
    functions: FxHashMap<Rc<str>, PrototypeId>,
    types: FxHashMap<Rc<str>, Rc<AggregateType>>,
    /// Declaration order, for emitting type definitions
    type_order: Vec<Rc<AggregateType>>,
}

impl GlobalScope {
    pub fn prototype_for(&self, name: &str) -> Option<PrototypeId> {
        self.functions.get(name).copied()
    }

    pub fn prototype(&self, id: PrototypeId) -> &Prototype {
        &self.prototypes[id]
    }

    pub fn prototype_mut(&mut self, id: PrototypeId) -> &mut Prototype {
        &mut self.prototypes[id]
    }

    /// All prototypes in the order they were first declared
    pub fn prototypes(&self) -> &[Prototype] {
        &self.prototypes
    }

    /// Register a new, unimplemented prototype
    pub fn declare_prototype(
        &mut self,
        name: Identifier,
        params: Vec<Identifier>,
        line: usize,
    ) -> Result<PrototypeId, CompileError> {
        if self.functions.contains_key(&name.name) {
            return Err(CompileError::Redeclared {
                name: name.name.to_string(),
                line,
            });
        }
        let id = self.prototypes.len();
        self.functions.insert(name.name.clone(), id);
        self.prototypes.push(Prototype {
            id,
            name,
            params,
            implemented: false,
            line,
        });
        Ok(id)
    }

    pub fn aggregate(&self, name: &str) -> Option<&Rc<AggregateType>> {
        self.types.get(name)
    }

    /// Aggregates in declaration order
    pub fn aggregates(&self) -> &[Rc<AggregateType>] {
        &self.type_order
    }

    pub fn declare_aggregate(
        &mut self,
        aggregate: AggregateType,
    ) -> Result<Rc<AggregateType>, CompileError> {
        if self.types.contains_key(&aggregate.name) {
            return Err(CompileError::Redeclared {
                name: aggregate.name.to_string(),
                line: aggregate.line,
            });
        }
        let aggregate = Rc::new(aggregate);
        self.types.insert(aggregate.name.clone(), aggregate.clone());
        self.type_order.push(aggregate.clone());
        Ok(aggregate)
    }
}

#[derive(Debug)]
struct Frame {
    parent: Option<ScopeId>,
    variables: FxHashMap<Rc<str>, Identifier>,
}

/// The scope chain seen by the parser
#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<Frame>,
    current: Option<ScopeId>,
    pub global: GlobalScope,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame nested in the current one and make it current
    pub fn enter(&mut self) -> ScopeId {
        let id = self.frames.len();
        self.frames.push(Frame {
            parent: self.current,
            variables: FxHashMap::default(),
        });
        self.current = Some(id);
        id
    }

    /// Return to the enclosing frame
    pub fn leave(&mut self) {
        self.current = self.current.and_then(|id| self.frames[id].parent);
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.current
    }

    /// Bind an identifier in the current frame.
    ///
    /// Shadowing an outer binding is fine; binding the same name twice in one
    /// frame is not.
    pub fn declare(&mut self, identifier: Identifier) -> Result<(), CompileError> {
        let Some(id) = self.current else {
            return Err(CompileError::type_error(
                format!("variable '{}' declared outside a function", identifier.name),
                identifier.line,
            ));
        };
        let frame = &mut self.frames[id];
        if frame.variables.contains_key(&identifier.name) {
            return Err(CompileError::Redeclared {
                name: identifier.name.to_string(),
                line: identifier.line,
            });
        }
        frame.variables.insert(identifier.name.clone(), identifier);
        Ok(())
    }

    /// Resolve a name: innermost variable first, then function prototypes
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        let mut frame = self.current;
        while let Some(id) = frame {
            if let Some(identifier) = self.frames[id].variables.get(name) {
                return Some(Symbol::Variable(identifier.clone()));
            }
            frame = self.frames[id].parent;
        }
        self.global.prototype_for(name).map(Symbol::Function)
    }

    /// Binding for a local declared in the current frame of `function`
    pub fn local_binding(&self, function: &Rc<str>) -> Binding {
        Binding::Local {
            function: function.clone(),
            scope: self.current.unwrap_or_default(),
        }
    }

    pub fn into_global(self) -> GlobalScope {
        self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::Type;

    fn local(scope: &Scope, name: &str, ty: Type) -> Identifier {
        let function: Rc<str> = Rc::from("main");
        Identifier::new(Rc::from(name), ty, scope.local_binding(&function), 1)
    }

    #[test]
    fn test_shadowing() {
        let mut scope = Scope::new();
        scope.enter();
        let outer = local(&scope, "x", Type::Int);
        scope.declare(outer.clone()).unwrap();

        scope.enter();
        let inner = local(&scope, "x", Type::Float);
        scope.declare(inner.clone()).unwrap();
        assert_eq!(scope.lookup("x"), Some(Symbol::Variable(inner)));

        scope.leave();
        assert_eq!(scope.lookup("x"), Some(Symbol::Variable(outer)));
    }

    #[test]
    fn test_redeclaration_in_same_frame() {
        let mut scope = Scope::new();
        scope.enter();
        scope.declare(local(&scope, "x", Type::Int)).unwrap();
        let err = scope.declare(local(&scope, "x", Type::Char)).unwrap_err();
        assert!(matches!(err, CompileError::Redeclared { .. }));
    }

    #[test]
    fn test_scope_numbers_are_unique() {
        let mut scope = Scope::new();
        let a = scope.enter();
        scope.leave();
        let b = scope.enter();
        assert_ne!(a, b);
        assert_ne!(
            local(&scope, "x", Type::Int).ir_name(),
            Identifier::new(
                Rc::from("x"),
                Type::Int,
                Binding::Local {
                    function: Rc::from("main"),
                    scope: a
                },
                1
            )
            .ir_name()
        );
    }

    #[test]
    fn test_function_fallback() {
        let mut scope = Scope::new();
        let name = Identifier::new(Rc::from("f"), Type::Int, Binding::Global, 1);
        let id = scope.global.declare_prototype(name, Vec::new(), 1).unwrap();

        scope.enter();
        assert_eq!(scope.lookup("f"), Some(Symbol::Function(id)));
        assert_eq!(scope.lookup("g"), None);

        // a local of the same name hides the function
        scope.declare(local(&scope, "f", Type::Int)).unwrap();
        assert!(matches!(scope.lookup("f"), Some(Symbol::Variable(_))));
    }

    #[test]
    fn test_aggregates_registered_once() {
        let mut global = GlobalScope::default();
        let point = AggregateType::new(Rc::from("Point"), vec![(Rc::from("x"), Type::Int)], 1);
        global.declare_aggregate(point).unwrap();
        let again = AggregateType::new(Rc::from("Point"), Vec::new(), 2);
        assert!(matches!(
            global.declare_aggregate(again),
            Err(CompileError::Redeclared { line: 2, .. })
        ));
        assert_eq!(global.aggregates().len(), 1);
        assert!(global.aggregate("Point").is_some());
    }
}
