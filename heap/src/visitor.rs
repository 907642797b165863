use crate::{Object, ObjectId};

pub trait Visitable {
    fn visit_edges(&self, visitor: &mut impl Visitor);
}

pub trait Visitor: Sized {
    fn visit(&mut self, id: ObjectId) {
        let _ = id;
    }
}

// visiting an object means visiting only its direct edges, the caller decides
// whether to keep walking.
impl Visitable for Object {
    #[inline]
    fn visit_edges(&self, visitor: &mut impl Visitor) {
        self.refs().iter().for_each(|&id| visitor.visit(id));
    }
}

// a plain vec is the mark worklist
impl Visitor for Vec<ObjectId> {
    #[inline]
    fn visit(&mut self, id: ObjectId) {
        self.push(id);
    }
}
